use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by planning and execution.
///
/// `InvalidJoinKey` is fatal and surfaces at `plan()` time, before any
/// estimation work. `EstimationUnavailable` and `RelationTooLarge` are
/// recoverable by the caller that sees them (auto-mode planning falls back
/// to sort-merge; the executor downgrades the strategy exactly once).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid join key: {0}")]
    InvalidJoinKey(String),

    #[error("size estimation unavailable: {0}")]
    EstimationUnavailable(String),

    #[error("relation too large to broadcast: {bytes} bytes exceeds cap of {cap}")]
    RelationTooLarge { bytes: u64, cap: u64 },

    #[error("execution cancelled")]
    Cancelled,

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("execution error: {0}")]
    Exec(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Exec(e.to_string())
    }
}
