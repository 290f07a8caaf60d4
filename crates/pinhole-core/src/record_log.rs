use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored (index, URL) pair.
///
/// The index label is kept next to the URL so every record describes
/// itself; a reader can tell when a record sits at the wrong position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The index this record was allocated.
    pub index: u64,
    /// The original URL that was shortened.
    pub original_url: String,
}

impl UrlRecord {
    pub fn new(index: u64, original_url: impl Into<String>) -> Self {
        Self {
            index,
            original_url: original_url.into(),
        }
    }
}

/// An append-only, position-addressed durable medium.
///
/// Records are addressed by their position in append order. The medium does
/// not check labels against positions; the index store does.
#[async_trait]
pub trait RecordLog: Send + Sync + 'static {
    /// Appends a record at the tail.
    ///
    /// On error nothing may remain of the record: a later append must land
    /// at the same position.
    async fn append(&self, record: &UrlRecord) -> Result<()>;

    /// Reads the record at `position`.
    /// Returns `None` if the medium holds fewer records.
    async fn read_at(&self, position: u64) -> Result<Option<UrlRecord>>;

    /// Returns the index label of every stored record, in append order.
    async fn labels(&self) -> Result<Vec<u64>>;
}
