//! Deterministic bake-off narratives.
//!
//! Pure string formatting over the rubric outcome; the same inputs always
//! produce byte-identical text, so narratives can be regenerated and compared
//! across environments.

use std::fmt::Write as _;

use model_specs::CandidateResult;

use crate::rubric::RubricOutcome;

/// One-line summary naming the champion and its margin over the runner-up.
#[must_use]
pub fn short_narrative(results: &[CandidateResult], outcome: &RubricOutcome) -> String {
    let champion = &results[outcome.champion_index];
    let champion_score = outcome.scores[outcome.champion_index].unwrap_or(0.0);

    let runner_up = outcome
        .eligible
        .iter()
        .filter(|&&idx| idx != outcome.champion_index)
        .filter_map(|&idx| outcome.scores[idx])
        .fold(None::<f32>, |best, score| {
            Some(best.map_or(score, |b| b.max(score)))
        });

    let mut line = match runner_up {
        Some(score) => format!(
            "{} selected as champion with rubric score {champion_score:.3}, {:.3} ahead of the runner-up.",
            champion.algorithm,
            champion_score - score
        ),
        None => format!(
            "{} selected as champion with rubric score {champion_score:.3} as the only eligible candidate.",
            champion.algorithm
        ),
    };
    if outcome.constraints_relaxed {
        line.push_str(" All candidates missed at least one constraint; ranking used weighted scores only.");
    }
    line
}

/// Per-candidate breakdown: one line per attempted candidate, in candidate
/// order, with the metrics the rubric scored.
#[must_use]
pub fn long_narrative(results: &[CandidateResult], outcome: &RubricOutcome) -> String {
    let mut text = short_narrative(results, outcome);
    text.push_str("\n\nCandidates:\n");

    for (idx, result) in results.iter().enumerate() {
        let marker = if idx == outcome.champion_index {
            " (champion)"
        } else if outcome.eligible.contains(&idx) {
            ""
        } else if result.failed {
            " (training failed)"
        } else {
            " (constraint violation)"
        };

        match outcome.scores[idx] {
            Some(score) => {
                let m = result.metrics;
                let _ = writeln!(
                    text,
                    "- {}: score {score:.3}, recall@rate {:.3}, pr_auc {:.3}, precision@rate {:.3}, stability {:.3}{marker}",
                    result.algorithm,
                    m.recall_at_review_rate,
                    m.pr_auc,
                    m.precision_at_review_rate,
                    m.stability,
                );
            }
            None => {
                let _ = writeln!(text, "- {}: not scored{marker}", result.algorithm);
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use model_specs::{Algorithm, CandidateConfig, CandidateMetrics, RubricConfig};

    use crate::rubric::apply_rubric;

    use super::*;

    fn results() -> Vec<CandidateResult> {
        let make = |algorithm, recall: f32, pr_auc: f32| CandidateResult {
            algorithm,
            hyperparams: Default::default(),
            metrics: CandidateMetrics {
                precision_at_review_rate: 0.5,
                recall_at_review_rate: recall,
                pr_auc,
                stability: 0.9,
            },
            importance: Vec::new(),
            artifact: Vec::new(),
            failed: false,
        };
        vec![
            make(Algorithm::LogReg, 0.4, 0.6),
            make(Algorithm::GradientBoosted, 0.7, 0.8),
            CandidateResult::failed(&CandidateConfig::new(Algorithm::ExtraTrees)),
        ]
    }

    #[test]
    fn test_short_narrative_names_champion_and_margin() {
        let results = results();
        let outcome = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        let short = short_narrative(&results, &outcome);
        assert!(short.contains("gradient_boosted"));
        assert!(short.contains("ahead of the runner-up"));
    }

    #[test]
    fn test_long_narrative_lists_every_candidate() {
        let results = results();
        let outcome = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        let long = long_narrative(&results, &outcome);
        assert!(long.contains("- log_reg:"));
        assert!(long.contains("(champion)"));
        assert!(long.contains("- extra_trees: not scored (training failed)"));
    }

    #[test]
    fn test_narratives_are_deterministic() {
        let results = results();
        let outcome = apply_rubric(&results, &RubricConfig::default()).expect("rubric");
        assert_eq!(
            long_narrative(&results, &outcome),
            long_narrative(&results, &outcome)
        );
    }
}
