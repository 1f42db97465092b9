//! Champion selection over trained candidates.

use model_specs::{CandidateResult, CoreError, CoreResult, RubricConfig};

/// The rubric's verdict over one candidate list.
#[derive(Debug, Clone)]
pub struct RubricOutcome {
    /// Index of the champion in the candidate list.
    pub champion_index: usize,
    /// Indices that were champion-eligible after constraint filtering.
    pub eligible: Vec<usize>,
    /// Weighted score per candidate; `None` for failed candidates.
    pub scores: Vec<Option<f32>>,
    /// True when every candidate violated some constraint and ranking fell
    /// back to all non-failed candidates.
    pub constraints_relaxed: bool,
}

/// Picks a champion from the attempted candidates.
///
/// Failed candidates are excluded first. Hard constraints then filter the
/// rest; if nothing survives, ranking falls back to all non-failed candidates
/// rather than leaving the bake-off without a champion. The winner maximizes
/// the weighted score, with ties going to the earlier candidate index.
///
/// # Errors
///
/// Returns a validation error only when every candidate failed training.
pub fn apply_rubric(
    results: &[CandidateResult],
    rubric: &RubricConfig,
) -> CoreResult<RubricOutcome> {
    let non_failed: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.failed)
        .map(|(idx, _)| idx)
        .collect();
    if non_failed.is_empty() {
        return Err(CoreError::validation(
            "every candidate failed training; no champion can be selected",
        ));
    }

    let mut eligible: Vec<usize> = non_failed
        .iter()
        .copied()
        .filter(|&idx| meets_constraints(&results[idx], rubric))
        .collect();
    let constraints_relaxed = eligible.is_empty();
    if constraints_relaxed {
        eligible = non_failed.clone();
    }

    let scores: Vec<Option<f32>> = results
        .iter()
        .map(|r| (!r.failed).then(|| weighted_score(r, rubric)))
        .collect();

    let mut champion_index = eligible[0];
    for &idx in &eligible[1..] {
        // Strict comparison keeps ties on the earlier index.
        if scores[idx] > scores[champion_index] {
            champion_index = idx;
        }
    }

    Ok(RubricOutcome {
        champion_index,
        eligible,
        scores,
        constraints_relaxed,
    })
}

fn meets_constraints(result: &CandidateResult, rubric: &RubricConfig) -> bool {
    let c = rubric.constraints;
    let m = result.metrics;
    c.min_recall_at_review_rate
        .is_none_or(|min| m.recall_at_review_rate >= min)
        && c.min_precision_at_review_rate
            .is_none_or(|min| m.precision_at_review_rate >= min)
        && c.min_pr_auc.is_none_or(|min| m.pr_auc >= min)
}

/// Weighted sum over the comparison metrics. Every input is already in
/// [0, 1], so no rescaling happens here.
fn weighted_score(result: &CandidateResult, rubric: &RubricConfig) -> f32 {
    let w = rubric.weights;
    let m = result.metrics;
    w.recall_at_review_rate * m.recall_at_review_rate
        + w.pr_auc * m.pr_auc
        + w.precision_at_review_rate * m.precision_at_review_rate
        + w.stability * m.stability
        + w.explainability * result.algorithm.explainability()
}

#[cfg(test)]
mod tests {
    use model_specs::{Algorithm, CandidateConfig, CandidateMetrics};

    use super::*;

    fn candidate(algorithm: Algorithm, metrics: CandidateMetrics) -> CandidateResult {
        CandidateResult {
            algorithm,
            hyperparams: Default::default(),
            metrics,
            importance: Vec::new(),
            artifact: Vec::new(),
            failed: false,
        }
    }

    fn metrics(precision: f32, recall: f32, pr_auc: f32, stability: f32) -> CandidateMetrics {
        CandidateMetrics {
            precision_at_review_rate: precision,
            recall_at_review_rate: recall,
            pr_auc,
            stability,
        }
    }

    #[test]
    fn test_constraint_eliminates_higher_scoring_candidate() {
        // log_reg has the better pr_auc but misses the recall floor; the
        // forest must win despite a lower weighted score.
        let results = vec![
            candidate(Algorithm::LogReg, metrics(0.8, 0.2, 0.9, 0.9)),
            candidate(Algorithm::RandomForest, metrics(0.6, 0.5, 0.6, 0.8)),
        ];
        let mut rubric = RubricConfig::default();
        rubric.constraints.min_recall_at_review_rate = Some(0.4);

        let outcome = apply_rubric(&results, &rubric).expect("rubric");
        assert_eq!(outcome.champion_index, 1);
        assert_eq!(outcome.eligible, vec![1]);
        assert!(!outcome.constraints_relaxed);
    }

    #[test]
    fn test_all_constraint_violations_relax_to_weighted_ranking() {
        let results = vec![
            candidate(Algorithm::LogReg, metrics(0.3, 0.2, 0.5, 0.9)),
            candidate(Algorithm::RandomForest, metrics(0.2, 0.3, 0.4, 0.8)),
        ];
        let mut rubric = RubricConfig::default();
        rubric.constraints.min_recall_at_review_rate = Some(0.9);

        let outcome = apply_rubric(&results, &rubric).expect("rubric");
        assert!(outcome.constraints_relaxed);
        assert_eq!(outcome.eligible, vec![0, 1]);
    }

    #[test]
    fn test_failed_candidates_are_never_eligible() {
        let mut failed = CandidateResult::failed(&CandidateConfig::new(Algorithm::GradientBoosted));
        failed.metrics = metrics(1.0, 1.0, 1.0, 1.0);
        let results = vec![
            failed,
            candidate(Algorithm::LogReg, metrics(0.5, 0.5, 0.5, 0.5)),
        ];

        let outcome = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        assert_eq!(outcome.champion_index, 1);
        assert!(outcome.scores[0].is_none());
    }

    #[test]
    fn test_all_failed_is_an_error() {
        let results = vec![
            CandidateResult::failed(&CandidateConfig::new(Algorithm::LogReg)),
            CandidateResult::failed(&CandidateConfig::new(Algorithm::ExtraTrees)),
        ];
        assert!(matches!(
            apply_rubric(&results, &RubricConfig::default()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_score_tie_goes_to_the_earlier_index() {
        // Identical algorithm and metrics, identical score.
        let m = metrics(0.5, 0.5, 0.5, 0.5);
        let results = vec![
            candidate(Algorithm::LogReg, m),
            candidate(Algorithm::LogReg, m),
        ];
        let outcome = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        assert_eq!(outcome.champion_index, 0);
    }

    #[test]
    fn test_rubric_is_deterministic() {
        let results = vec![
            candidate(Algorithm::LogReg, metrics(0.4, 0.6, 0.7, 0.9)),
            candidate(Algorithm::GradientBoosted, metrics(0.7, 0.8, 0.8, 0.6)),
            candidate(Algorithm::ExtraTrees, metrics(0.5, 0.5, 0.6, 0.7)),
        ];
        let first = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        let second = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        assert_eq!(first.champion_index, second.champion_index);
        assert_eq!(first.scores, second.scores);
    }
}
