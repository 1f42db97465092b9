//! Bake-off orchestration and champion selection.

pub mod narrative;
pub mod orchestrator;
pub mod rubric;

pub use narrative::{long_narrative, short_narrative};
pub use orchestrator::{CandidateSummary, FinalizeOutcome, Orchestrator, StartBakeoff};
pub use rubric::{RubricOutcome, apply_rubric};
