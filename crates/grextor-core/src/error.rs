use thiserror::Error;

/// Top-level error type for the Grextor system.
///
/// Backend adapters report failures through the store variants, tagging the
/// backend that produced them. Pipeline-level context (which step failed) is
/// added by the engine crate on top of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrextorError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("{backend} unavailable: {reason}")]
    StoreUnavailable { backend: String, reason: String },

    #[error("{backend} write failed: {reason}")]
    StoreWrite { backend: String, reason: String },

    #[error("{backend} read failed: {reason}")]
    StoreRead { backend: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GrextorError {
    pub fn unavailable(backend: impl Into<String>, reason: impl ToString) -> Self {
        GrextorError::StoreUnavailable {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(backend: impl Into<String>, reason: impl ToString) -> Self {
        GrextorError::StoreWrite {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    pub fn read(backend: impl Into<String>, reason: impl ToString) -> Self {
        GrextorError::StoreRead {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    /// True for `Cancelled` and `DeadlineExceeded`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GrextorError::Cancelled | GrextorError::DeadlineExceeded)
    }
}

impl From<toml::de::Error> for GrextorError {
    fn from(err: toml::de::Error) -> Self {
        GrextorError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for GrextorError {
    fn from(err: toml::ser::Error) -> Self {
        GrextorError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for GrextorError {
    fn from(err: serde_json::Error) -> Self {
        GrextorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Grextor operations.
pub type Result<T> = std::result::Result<T, GrextorError>;
