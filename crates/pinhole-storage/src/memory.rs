use async_trait::async_trait;
use pinhole_core::record_log::{RecordLog, Result, UrlRecord};
use pinhole_core::StorageError;
use std::sync::RwLock;

/// Volatile implementation of [`RecordLog`] backed by a vector.
///
/// Contents are lost when the process exits. Useful for tests and for
/// throwaway deployments.
#[derive(Debug, Default)]
pub struct InMemoryLog {
    records: RwLock<Vec<UrlRecord>>,
}

impl InMemoryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log pre-filled with `records`, in the given order.
    ///
    /// Labels are taken as-is, so this can also model a damaged medium.
    pub fn from_records(records: Vec<UrlRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordLog for InMemoryLog {
    async fn append(&self, record: &UrlRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| StorageError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }

    async fn read_at(&self, position: u64) -> Result<Option<UrlRecord>> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        let Ok(position) = usize::try_from(position) else {
            return Ok(None);
        };
        Ok(records.get(position).cloned())
    }

    async fn labels(&self) -> Result<Vec<u64>> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(records.iter().map(|record| record.index).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_back() {
        let log = InMemoryLog::new();

        log.append(&UrlRecord::new(0, "https://example.com"))
            .await
            .unwrap();
        log.append(&UrlRecord::new(1, "https://example.org"))
            .await
            .unwrap();

        let record = log.read_at(1).await.unwrap().unwrap();
        assert_eq!(record, UrlRecord::new(1, "https://example.org"));
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn read_past_end_is_none() {
        let log = InMemoryLog::new();
        assert!(log.is_empty());
        assert!(log.read_at(0).await.unwrap().is_none());
        assert!(log.read_at(u64::MAX).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn labels_follow_append_order() {
        let log = InMemoryLog::from_records(vec![
            UrlRecord::new(0, "https://a.example"),
            UrlRecord::new(5, "https://b.example"),
        ]);
        log.append(&UrlRecord::new(2, "https://c.example"))
            .await
            .unwrap();

        assert_eq!(log.labels().await.unwrap(), vec![0, 5, 2]);
    }
}
