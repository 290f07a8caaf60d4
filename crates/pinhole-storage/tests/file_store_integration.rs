use std::path::PathBuf;

use pinhole_core::{RecordLog, StorageError};
use pinhole_storage::{FileLog, IndexStore, StoreError, StoreSettings};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("saved_urls.csv");
        Self { _dir: dir, path }
    }

    fn with_contents(contents: &str) -> Self {
        let fixture = Self::new();
        std::fs::write(&fixture.path, contents).expect("seed record file");
        fixture
    }

    async fn open(&self) -> Result<IndexStore<FileLog>, StoreError> {
        let log = FileLog::open(&self.path).await?;
        IndexStore::open(log).await
    }

    fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("read record file")
    }
}

#[tokio::test]
async fn allocations_land_in_file_in_order() {
    let fixture = Fixture::new();
    let store = fixture.open().await.unwrap();

    for i in 0..10u64 {
        let index = store
            .allocate(&format!("https://example.com/{i}"))
            .await
            .unwrap();
        assert_eq!(index, i);
    }

    let lines: Vec<String> = fixture.contents().lines().map(str::to_owned).collect();
    assert_eq!(lines.len(), 10);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &format!("{i},https://example.com/{i}"));
    }
}

#[tokio::test]
async fn restart_continues_counter() {
    let fixture = Fixture::with_contents(
        "0,https://a.example\n1,https://b.example\n2,https://c.example\n",
    );

    let store = fixture.open().await.unwrap();
    assert_eq!(store.allocated(), 3);
    assert_eq!(store.allocate("https://d.example").await.unwrap(), 3);
    drop(store);

    let store = fixture.open().await.unwrap();
    assert_eq!(store.allocated(), 4);
    assert_eq!(
        store.lookup(3).await.unwrap().original_url,
        "https://d.example"
    );
}

#[tokio::test]
async fn out_of_order_file_refuses_to_start() {
    let fixture = Fixture::with_contents("0,https://a.example\n2,https://b.example\n");

    let err = fixture.open().await.err().unwrap();
    assert!(matches!(
        err,
        StoreError::Corrupted {
            position: 1,
            label: 2
        }
    ));
}

#[tokio::test]
async fn garbled_file_refuses_to_start() {
    let fixture = Fixture::with_contents("0,https://a.example\nnot a record\n");

    let err = fixture.open().await.err().unwrap();
    assert!(matches!(err, StoreError::Storage(StorageError::InvalidData(_))));
}

#[tokio::test]
async fn torn_multiline_record_refuses_to_start() {
    let fixture = Fixture::with_contents("0,https://a.example\n1,\"https://b.example/x\n");

    let err = fixture.open().await.err().unwrap();
    assert!(matches!(err, StoreError::Storage(StorageError::InvalidData(_))));
}

#[tokio::test]
async fn exhausted_store_keeps_file_untouched() {
    let fixture = Fixture::with_contents("0,https://a.example\n1,https://b.example\n");
    let log = FileLog::open(&fixture.path).await.unwrap();
    let settings = StoreSettings::builder().limit(2).build();
    let store = IndexStore::open_with(log, settings).await.unwrap();

    let err = store.allocate("https://c.example").await.unwrap_err();
    assert!(matches!(err, StoreError::DomainExhausted { limit: 2 }));
    assert_eq!(
        fixture.contents(),
        "0,https://a.example\n1,https://b.example\n"
    );
}

#[tokio::test]
async fn urls_with_delimiters_survive_restart() {
    let fixture = Fixture::new();
    let awkward = "https://example.com/search?q=a,b&note=\"quoted\"\nsecond line";

    {
        let store = fixture.open().await.unwrap();
        store.allocate(awkward).await.unwrap();
        store.allocate("https://plain.example").await.unwrap();
    }

    let store = fixture.open().await.unwrap();
    assert_eq!(store.allocated(), 2);
    assert_eq!(store.lookup(0).await.unwrap().original_url, awkward);
    assert_eq!(
        store.lookup(1).await.unwrap().original_url,
        "https://plain.example"
    );

    let log = FileLog::open(&fixture.path).await.unwrap();
    assert_eq!(log.labels().await.unwrap(), vec![0, 1]);
}
