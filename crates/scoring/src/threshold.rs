//! Decision-threshold derivation from a review rate.

use learners::flagged_count;

/// The score cutoff that flags roughly `review_rate` of the rows: the k-th
/// highest score where `k = ceil(review_rate * n)`, floored at one row.
///
/// Rows tying the cutoff score are all flagged, so the flagged share can
/// exceed the review rate when scores tie exactly at the boundary.
#[must_use]
pub fn threshold_for_review_rate(scores: &[f32], review_rate: f32) -> f32 {
    let k = flagged_count(scores.len(), review_rate);
    if k == 0 {
        return 0.0;
    }

    let mut sorted: Vec<f32> = scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted[k - 1]
}
