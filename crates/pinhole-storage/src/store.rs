use crate::error::{Result, StoreError};
use pinhole_core::{RecordLog, StorageError, UrlRecord, DOMAIN_SIZE};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// Configures an [`IndexStore`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct StoreSettings {
    /// Indexes are handed out from `[0, limit)`. Must be in `1..=DOMAIN_SIZE`.
    #[builder(default = DOMAIN_SIZE)]
    pub limit: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Hands out dense indexes and keeps the `index -> url` mapping durable.
///
/// Position `n` of the underlying log always holds the record labeled `n`.
/// Allocation is serialized by one async mutex that covers both the append
/// and the counter bump, so an index is only spent once its record is on
/// the medium. Lookups never take that mutex.
///
/// Cloning is cheap and yields a handle to the same store. Only one process
/// may write to a given medium.
pub struct IndexStore<L: RecordLog> {
    inner: Arc<Inner<L>>,
}

impl<L: RecordLog> Clone for IndexStore<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<L> {
    log: L,
    limit: u64,
    next_index: Mutex<u64>,
    /// Published copy of `next_index`, written only after a successful append.
    allocated: AtomicU64,
}

impl<L: RecordLog> IndexStore<L> {
    /// Recovers a store from `log` with default settings.
    pub async fn open(log: L) -> Result<Self> {
        Self::open_with(log, StoreSettings::default()).await
    }

    /// Recovers a store from `log`.
    ///
    /// Every record label is checked against its position. Any gap,
    /// repetition or reordering fails with [`StoreError::Corrupted`]; the
    /// counter is never guessed from a damaged medium.
    pub async fn open_with(log: L, settings: StoreSettings) -> Result<Self> {
        let limit = settings.limit;
        if limit == 0 || limit > DOMAIN_SIZE {
            return Err(StoreError::InvalidLimit {
                limit,
                max: DOMAIN_SIZE,
            });
        }

        let labels = log.labels().await?;
        for (position, &label) in labels.iter().enumerate() {
            let position = position as u64;
            if label != position {
                error!(position, label, "record label does not match its position");
                return Err(StoreError::Corrupted { position, label });
            }
        }

        let next_index = labels.len() as u64;
        if next_index > limit {
            return Err(StoreError::LimitBelowStored {
                limit,
                stored: next_index,
            });
        }

        info!(next_index, limit, "recovered index store");

        Ok(Self {
            inner: Arc::new(Inner {
                log,
                limit,
                next_index: Mutex::new(next_index),
                allocated: AtomicU64::new(next_index),
            }),
        })
    }

    /// Persists `original_url` under the next free index and returns it.
    ///
    /// Fails with [`StoreError::DomainExhausted`] once every index below the
    /// limit is taken. A failed append leaves the counter untouched.
    pub async fn allocate(&self, original_url: &str) -> Result<u64> {
        if original_url.is_empty() {
            return Err(StoreError::EmptyUrl);
        }

        // Run the critical section on its own task: a caller dropped between
        // the append and the counter bump must not leave a record behind
        // that a later allocation would label again.
        let inner = Arc::clone(&self.inner);
        let original_url = original_url.to_owned();
        tokio::spawn(async move { inner.allocate(original_url).await })
            .await
            .map_err(|e| {
                StoreError::Storage(StorageError::Operation(format!(
                    "allocation task failed: {e}"
                )))
            })?
    }

    /// Reads back the record stored for `index`.
    ///
    /// Returns [`StoreError::NotFound`] for indexes that have not been
    /// allocated, and [`StoreError::Corrupted`] when the record at that
    /// position carries a different label.
    pub async fn lookup(&self, index: u64) -> Result<UrlRecord> {
        if index >= self.allocated() {
            return Err(StoreError::NotFound(index));
        }

        let Some(record) = self.inner.log.read_at(index).await? else {
            error!(index, "allocated record is missing from the medium");
            return Err(StoreError::NotFound(index));
        };

        if record.index != index {
            error!(
                position = index,
                label = record.index,
                "record label does not match its position"
            );
            return Err(StoreError::Corrupted {
                position: index,
                label: record.index,
            });
        }

        Ok(record)
    }

    /// Number of indexes allocated so far; every index below it is readable.
    pub fn allocated(&self) -> u64 {
        self.inner.allocated.load(Ordering::Acquire)
    }

    /// Upper bound (exclusive) of the indexes this store hands out.
    pub fn limit(&self) -> u64 {
        self.inner.limit
    }
}

impl<L: RecordLog> Inner<L> {
    async fn allocate(&self, original_url: String) -> Result<u64> {
        let mut next_index = self.next_index.lock().await;
        let index = *next_index;
        if index >= self.limit {
            warn!(limit = self.limit, "code space exhausted");
            return Err(StoreError::DomainExhausted { limit: self.limit });
        }

        let record = UrlRecord::new(index, original_url);
        if let Err(e) = self.log.append(&record).await {
            error!(index, error = %e, "failed to persist record");
            return Err(e.into());
        }

        *next_index = index + 1;
        self.allocated.store(index + 1, Ordering::Release);
        debug!(index, "allocated index");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileLog, InMemoryLog};
    use async_trait::async_trait;
    use pinhole_core::record_log;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    /// Delegates to an in-memory log but can be told to reject appends.
    #[derive(Default)]
    struct FlakyLog {
        inner: InMemoryLog,
        fail_appends: AtomicBool,
    }

    #[async_trait]
    impl RecordLog for FlakyLog {
        async fn append(&self, record: &UrlRecord) -> record_log::Result<()> {
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(StorageError::Io("disk full".to_string()));
            }
            self.inner.append(record).await
        }

        async fn read_at(&self, position: u64) -> record_log::Result<Option<UrlRecord>> {
            self.inner.read_at(position).await
        }

        async fn labels(&self) -> record_log::Result<Vec<u64>> {
            self.inner.labels().await
        }
    }

    /// Serves each read from the following position, like a misaligned medium.
    struct ShiftedLog(InMemoryLog);

    #[async_trait]
    impl RecordLog for ShiftedLog {
        async fn append(&self, record: &UrlRecord) -> record_log::Result<()> {
            self.0.append(record).await
        }

        async fn read_at(&self, position: u64) -> record_log::Result<Option<UrlRecord>> {
            self.0.read_at(position + 1).await
        }

        async fn labels(&self) -> record_log::Result<Vec<u64>> {
            self.0.labels().await
        }
    }

    fn records(urls: &[&str]) -> Vec<UrlRecord> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| UrlRecord::new(i as u64, *url))
            .collect()
    }

    #[tokio::test]
    async fn empty_store_starts_at_zero() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();
        assert_eq!(store.allocated(), 0);
        assert_eq!(store.limit(), DOMAIN_SIZE);

        let index = store.allocate("https://example.com").await.unwrap();
        assert_eq!(index, 0);

        let record = store.lookup(0).await.unwrap();
        assert_eq!(record.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn allocation_is_monotonic_and_gap_free() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();

        for expected in 0..25 {
            let index = store
                .allocate(&format!("https://example.com/{expected}"))
                .await
                .unwrap();
            assert_eq!(index, expected);
        }

        assert_eq!(store.allocated(), 25);
        assert_eq!(
            store.inner.log.labels().await.unwrap(),
            (0..25).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn identical_urls_get_distinct_indexes() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();

        let first = store.allocate("https://example.com").await.unwrap();
        let second = store.allocate("https://example.com").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn empty_url_is_rejected() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();

        let err = store.allocate("").await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyUrl));
        assert_eq!(store.allocated(), 0);
    }

    #[tokio::test]
    async fn recovery_resumes_after_last_record() {
        let log = InMemoryLog::from_records(records(&[
            "https://a.example",
            "https://b.example",
            "https://c.example",
        ]));

        let store = IndexStore::open(log).await.unwrap();
        assert_eq!(store.allocated(), 3);
        assert_eq!(store.allocate("https://d.example").await.unwrap(), 3);
        assert_eq!(
            store.lookup(1).await.unwrap().original_url,
            "https://b.example"
        );
    }

    #[tokio::test]
    async fn recovery_from_file_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        {
            let store = IndexStore::open(FileLog::open(&path).await.unwrap())
                .await
                .unwrap();
            for i in 0..5 {
                store
                    .allocate(&format!("https://example.com/{i}"))
                    .await
                    .unwrap();
            }
        }

        let store = IndexStore::open(FileLog::open(&path).await.unwrap())
            .await
            .unwrap();
        assert_eq!(store.allocated(), 5);
        assert_eq!(store.allocate("https://example.com/5").await.unwrap(), 5);
        assert_eq!(
            store.lookup(2).await.unwrap().original_url,
            "https://example.com/2"
        );
    }

    #[tokio::test]
    async fn gap_in_labels_fails_startup() {
        let log = InMemoryLog::from_records(vec![
            UrlRecord::new(0, "https://a.example"),
            UrlRecord::new(2, "https://b.example"),
        ]);

        let err = IndexStore::open(log).await.err().unwrap();
        assert!(matches!(
            err,
            StoreError::Corrupted {
                position: 1,
                label: 2
            }
        ));
    }

    #[tokio::test]
    async fn repeated_label_fails_startup() {
        let log = InMemoryLog::from_records(vec![
            UrlRecord::new(0, "https://a.example"),
            UrlRecord::new(1, "https://b.example"),
            UrlRecord::new(1, "https://c.example"),
        ]);

        let err = IndexStore::open(log).await.err().unwrap();
        assert!(matches!(
            err,
            StoreError::Corrupted {
                position: 2,
                label: 1
            }
        ));
    }

    #[tokio::test]
    async fn label_mismatch_fails_lookup() {
        let log = ShiftedLog(InMemoryLog::new());
        let store = IndexStore::open(log).await.unwrap();
        store.allocate("https://a.example").await.unwrap();
        store.allocate("https://b.example").await.unwrap();

        let err = store.lookup(0).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Corrupted {
                position: 0,
                label: 1
            }
        ));

        // the last record has nothing after it
        let err = store.lookup(1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(1)));
    }

    #[tokio::test]
    async fn tampered_file_fails_lookup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        let store = IndexStore::open(FileLog::open(&path).await.unwrap())
            .await
            .unwrap();
        store.allocate("https://a.example").await.unwrap();
        store.allocate("https://b.example").await.unwrap();

        // same length, different label on the second row
        std::fs::write(&path, "0,https://a.example\n7,https://b.example\n").unwrap();

        assert!(store.lookup(0).await.is_ok());
        let err = store.lookup(1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Corrupted {
                position: 1,
                label: 7
            }
        ));
    }

    #[tokio::test]
    async fn lookup_beyond_allocated_is_not_found() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();
        store.allocate("https://a.example").await.unwrap();

        assert!(matches!(
            store.lookup(1).await.unwrap_err(),
            StoreError::NotFound(1)
        ));
        assert!(matches!(
            store.lookup(DOMAIN_SIZE).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn exhaustion_is_permanent() {
        let settings = StoreSettings::builder().limit(3).build();
        let store = IndexStore::open_with(InMemoryLog::new(), settings)
            .await
            .unwrap();

        for expected in 0..3 {
            assert_eq!(store.allocate("https://a.example").await.unwrap(), expected);
        }

        for _ in 0..2 {
            let err = store.allocate("https://a.example").await.unwrap_err();
            assert!(matches!(err, StoreError::DomainExhausted { limit: 3 }));
            assert_eq!(store.allocated(), 3);
        }
        assert_eq!(store.inner.log.labels().await.unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn invalid_limits_are_rejected() {
        for limit in [0, DOMAIN_SIZE + 1] {
            let settings = StoreSettings::builder().limit(limit).build();
            let err = IndexStore::open_with(InMemoryLog::new(), settings)
                .await
                .err()
                .unwrap();
            assert!(matches!(err, StoreError::InvalidLimit { .. }));
        }
    }

    #[tokio::test]
    async fn limit_below_stored_records_is_rejected() {
        let log = InMemoryLog::from_records(records(&["https://a.example", "https://b.example"]));
        let settings = StoreSettings::builder().limit(1).build();

        let err = IndexStore::open_with(log, settings).await.err().unwrap();
        assert!(matches!(
            err,
            StoreError::LimitBelowStored {
                limit: 1,
                stored: 2
            }
        ));
    }

    #[tokio::test]
    async fn failed_append_does_not_spend_an_index() {
        let store = IndexStore::open(FlakyLog::default()).await.unwrap();
        assert_eq!(store.allocate("https://a.example").await.unwrap(), 0);

        store.inner.log.fail_appends.store(true, Ordering::SeqCst);
        let err = store.allocate("https://b.example").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Io(_))));
        assert_eq!(store.allocated(), 1);

        store.inner.log.fail_appends.store(false, Ordering::SeqCst);
        assert_eq!(store.allocate("https://b.example").await.unwrap(), 1);
        assert_eq!(store.inner.log.labels().await.unwrap(), vec![0, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_never_collide() {
        let store = IndexStore::open(InMemoryLog::new()).await.unwrap();
        let mut handles = vec![];

        for i in 0..64u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .allocate(&format!("https://example{i}.com"))
                    .await
                    .unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }

        assert_eq!(seen, (0..64).collect::<HashSet<_>>());
        assert_eq!(
            store.inner.log.labels().await.unwrap(),
            (0..64).collect::<Vec<_>>()
        );
        for index in 0..64 {
            assert_eq!(store.lookup(index).await.unwrap().index, index);
        }
    }
}
