use pinhole_core::StorageError;
use thiserror::Error;

/// Result type for index store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("url cannot be empty")]
    EmptyUrl,
    #[error("code space exhausted: all {limit} indexes are allocated")]
    DomainExhausted { limit: u64 },
    #[error("no record stored for index {0}")]
    NotFound(u64),
    #[error("record at position {position} is labeled {label}")]
    Corrupted { position: u64, label: u64 },
    #[error("limit {limit} must be in 1..={max}")]
    InvalidLimit { limit: u64, max: u64 },
    #[error("limit {limit} is below the {stored} records already stored")]
    LimitBelowStored { limit: u64, stored: u64 },
    #[error("storage error: {0}")]
    Storage(
        #[from]
        #[source]
        StorageError,
    ),
}
