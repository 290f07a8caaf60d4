use thiserror::Error;

/// Errors raised by a durable medium.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage state lock is poisoned")]
    Poisoned,
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Errors surfaced by a [`Shortener`][crate::Shortener].
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("index {0} has not been allocated")]
    OutOfRange(u64),
    #[error("no record stored for index {0}")]
    NotFound(u64),
    #[error("code space exhausted")]
    DomainExhausted,
    #[error("stored record is corrupted: {0}")]
    Corrupted(String),
    #[error("storage error: {0}")]
    Storage(String),
}
