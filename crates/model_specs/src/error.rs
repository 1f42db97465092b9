//! Error taxonomy shared by every wirebench crate.

/// Result alias used across the workspace.
pub type CoreResult<T> = Result<T, CoreError>;

/// The error kinds surfaced by the orchestrator, rubric engine and scoring
/// pipeline.
///
/// The taxonomy is part of the public contract: callers retry nothing on
/// `NotFound`, re-sequence on `Conflict`, and fix their input on
/// `Validation`. `CandidateTraining` is caught per candidate and never aborts
/// a bake-off; `Pipeline` marks the owning bakeoff or run as failed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("candidate training failed: {0}")]
    CandidateTraining(String),

    #[error("pipeline failure: {0}")]
    Pipeline(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Wraps a database or blob-store error.
    ///
    /// A plain constructor instead of `From` impls keeps this crate free of
    /// storage dependencies.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    #[must_use]
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
