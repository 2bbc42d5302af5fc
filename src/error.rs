use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the registry, queue, and analyzer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No task or record exists for the given id.
    #[error("no task for url id {0}")]
    NotFound(u64),

    /// The analyzer failed to produce a result (network, HTTP status, or parse error).
    #[error("analysis failed: {0}")]
    AnalysisFailure(String),

    /// The analyzer observed the cooperative stop flag and abandoned the fetch.
    #[error("analysis stopped")]
    CooperativeStop,

    /// Construction-time argument was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
