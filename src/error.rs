use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the trainer.
///
/// Variants are matched structurally by callers (and by the TUI when deciding
/// what to show); none of them is retryable. Result submission is the only
/// operation with built-in retry safety, and it succeeds idempotently rather
/// than erroring.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input: out-of-range pace or chunk size, answer/question
    /// count mismatch, a question set that fails structural validation,
    /// or completion metrics that fail the plausibility checks
    #[error("validation error: {0}")]
    Validation(String),

    /// State conflict: completing an already-completed session, or
    /// submitting answers for a session with no question set
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown passage, file, or session id
    #[error("not found: {0}")]
    NotFound(String),

    /// History database failure (wraps rusqlite::Error)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O failure (wraps std::io::Error)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// History export failure (wraps csv::Error)
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
}
