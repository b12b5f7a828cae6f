use thiserror::Error;

/// Library error type for gallery storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured media root is invalid or unusable.
    #[error("invalid media root: {0}")]
    BadRoot(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
