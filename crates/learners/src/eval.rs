//! Evaluation metrics for anomaly scores against binary labels.

use model_specs::LabelMetrics;

/// Number of rows flagged at a review rate: `ceil(rate * n)`, at least one
/// when any rows exist.
#[must_use]
pub fn flagged_count(row_count: usize, review_rate: f32) -> usize {
    if row_count == 0 {
        return 0;
    }
    let k = (review_rate * row_count as f32).ceil() as usize;
    k.clamp(1, row_count)
}

/// Precision and recall when exactly the top `flagged_count` scored rows are
/// reviewed. Ties inside the cutoff are resolved by original row order, so
/// the result is deterministic.
#[must_use]
pub fn precision_recall_at_review_rate(scores: &[f32], labels: &[f32], review_rate: f32) -> (f32, f32) {
    let k = flagged_count(scores.len(), review_rate);
    if k == 0 {
        return (0.0, 0.0);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let positives = labels.iter().filter(|&&l| l > 0.5).count();
    let true_positives = order
        .iter()
        .take(k)
        .filter(|&&idx| labels[idx] > 0.5)
        .count();

    let precision = true_positives as f32 / k as f32;
    let recall = if positives == 0 {
        0.0
    } else {
        true_positives as f32 / positives as f32
    };
    (precision, recall)
}

/// Area under the precision-recall curve, computed as average precision.
#[must_use]
pub fn pr_auc(scores: &[f32], labels: &[f32]) -> f32 {
    let positives = labels.iter().filter(|&&l| l > 0.5).count();
    if positives == 0 || scores.is_empty() {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut true_positives = 0usize;
    let mut auc = 0.0f32;
    for (seen, idx) in order.iter().enumerate() {
        if labels[*idx] > 0.5 {
            true_positives += 1;
            let precision = true_positives as f32 / (seen + 1) as f32;
            // Each positive adds a recall step of 1/positives.
            auc += precision / positives as f32;
        }
    }
    auc
}

/// Precision, recall and F1 for a fixed decision threshold (score >= threshold
/// is flagged).
#[must_use]
pub fn metrics_at_threshold(scores: &[f32], labels: &[f32], threshold: f32) -> LabelMetrics {
    let mut true_positives = 0usize;
    let mut flagged = 0usize;
    let mut positives = 0usize;

    for (score, label) in scores.iter().zip(labels) {
        let is_positive = *label > 0.5;
        let is_flagged = *score >= threshold;
        positives += usize::from(is_positive);
        flagged += usize::from(is_flagged);
        true_positives += usize::from(is_positive && is_flagged);
    }

    let precision = if flagged == 0 {
        0.0
    } else {
        true_positives as f32 / flagged as f32
    };
    let recall = if positives == 0 {
        0.0
    } else {
        true_positives as f32 / positives as f32
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    LabelMetrics { precision, recall, f1 }
}
