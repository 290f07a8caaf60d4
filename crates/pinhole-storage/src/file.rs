use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use pinhole_core::record_log::{RecordLog, Result, UrlRecord};
use pinhole_core::StorageError;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info};

/// Append-only file of delimited records, one `index,url` row per record.
///
/// Rows use CSV quoting, so commas, quotes and line breaks inside a URL are
/// escaped and the file stays readable with ordinary tools. The byte offset
/// and label of every row is kept in memory, so [`RecordLog::read_at`] seeks
/// straight to the row and [`RecordLog::labels`] never rescans the file.
///
/// Blocking file I/O runs on the tokio blocking pool.
#[derive(Debug, Clone)]
pub struct FileLog {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    tail: Mutex<Tail>,
    rows: RwLock<Vec<RowEntry>>,
}

#[derive(Debug)]
struct Tail {
    file: File,
    end: u64,
    /// Set when a failed append could not be rolled back. The bytes past
    /// `end` are then unknown, so no further row may be written.
    broken: bool,
}

/// Where a row starts and which index it carries.
#[derive(Debug, Clone, Copy)]
struct RowEntry {
    offset: u64,
    label: u64,
}

impl FileLog {
    /// Opens the log at `path`, creating an empty file if none exists.
    ///
    /// Existing data is never truncated. The whole file is scanned once to
    /// index row offsets; a malformed or torn row fails the open.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = tokio::task::spawn_blocking(move || Inner::open(path))
            .await
            .map_err(join_error)??;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    async fn blocking<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || task(&inner))
            .await
            .map_err(join_error)?
    }
}

impl Inner {
    fn open(path: PathBuf) -> Result<Self> {
        let existed = path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        let end = file.metadata()?.len();

        if end > 0 {
            file.seek(SeekFrom::Start(end - 1))?;
            let mut last = [0_u8; 1];
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                return Err(StorageError::InvalidData(format!(
                    "{} ends with an unterminated record",
                    path.display()
                )));
            }
        }

        let rows = scan(&path, end)?;

        if existed {
            info!(path = %path.display(), records = rows.len(), "opened record file");
        } else {
            info!(path = %path.display(), "created empty record file");
        }

        Ok(Self {
            path,
            tail: Mutex::new(Tail {
                file,
                end,
                broken: false,
            }),
            rows: RwLock::new(rows),
        })
    }

    fn append(&self, record: &UrlRecord) -> Result<()> {
        let row = encode_row(record)?;
        let mut tail = self.tail.lock().map_err(|_| StorageError::Poisoned)?;
        let Tail { file, end, broken } = &mut *tail;
        if *broken {
            return Err(StorageError::Operation(format!(
                "{} holds an unrolled partial record, refusing to append",
                self.path.display()
            )));
        }
        let offset = *end;

        let written = file.write_all(&row).and_then(|()| file.sync_data());
        if let Err(e) = written {
            // Drop whatever part of the row reached the file so the next
            // append starts on a clean row boundary.
            if let Err(truncate_err) = file.set_len(offset) {
                error!(
                    path = %self.path.display(),
                    offset,
                    error = %truncate_err,
                    "failed to roll back partial record, log is now read-only"
                );
                *broken = true;
            }
            return Err(e.into());
        }

        *end = offset + row.len() as u64;
        self.rows
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .push(RowEntry {
                offset,
                label: record.index,
            });
        debug!(index = record.index, offset, "appended record");
        Ok(())
    }

    fn read_at(&self, position: u64) -> Result<Option<UrlRecord>> {
        let offset = {
            let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
            let Some(entry) = usize::try_from(position)
                .ok()
                .and_then(|position| rows.get(position).copied())
            else {
                return Ok(None);
            };
            entry.offset
        };

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = reader_builder().from_reader(BufReader::new(file));
        let mut row = StringRecord::new();
        if !reader.read_record(&mut row).map_err(map_csv_error)? {
            return Ok(None);
        }
        decode_row(&row, position).map(Some)
    }
}

#[async_trait]
impl RecordLog for FileLog {
    async fn append(&self, record: &UrlRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |inner| inner.append(&record)).await
    }

    async fn read_at(&self, position: u64) -> Result<Option<UrlRecord>> {
        self.blocking(move |inner| inner.read_at(position)).await
    }

    async fn labels(&self) -> Result<Vec<u64>> {
        let rows = self.inner.rows.read().map_err(|_| StorageError::Poisoned)?;
        Ok(rows.iter().map(|row| row.label).collect())
    }
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

/// Reads every row of the file from the beginning.
///
/// The last row must re-encode to exactly the bytes between its offset and
/// `len`. A crash inside a quoted URL can leave a tail that ends in `\n` and
/// still parses, but never one that matches its own encoding.
fn scan(path: &Path, len: u64) -> Result<Vec<RowEntry>> {
    let file = File::open(path)?;
    let mut reader = reader_builder().from_reader(BufReader::new(file));
    let mut row = StringRecord::new();
    let mut rows = Vec::new();
    let mut last_end = 0;

    while reader.read_record(&mut row).map_err(map_csv_error)? {
        let position = rows.len() as u64;
        let offset = row.position().map(|p| p.byte()).ok_or_else(|| {
            StorageError::InvalidData(format!("row {position} has no byte position"))
        })?;
        let record = decode_row(&row, position)?;
        last_end = offset + encode_row(&record)?.len() as u64;
        rows.push(RowEntry {
            offset,
            label: record.index,
        });
    }

    if last_end != len {
        return Err(StorageError::InvalidData(format!(
            "{} ends with a torn record: rows cover {last_end} of {len} bytes",
            path.display()
        )));
    }

    Ok(rows)
}

fn encode_row(record: &UrlRecord) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    let index = record.index.to_string();
    writer
        .write_record([index.as_str(), record.original_url.as_str()])
        .map_err(map_csv_error)?;
    writer
        .into_inner()
        .map_err(|e| StorageError::Operation(format!("failed to encode record: {e}")))
}

fn decode_row(row: &StringRecord, position: u64) -> Result<UrlRecord> {
    if row.len() != 2 {
        return Err(StorageError::InvalidData(format!(
            "row {position} has {} fields, expected 2",
            row.len()
        )));
    }
    let index = row[0].parse::<u64>().map_err(|e| {
        StorageError::InvalidData(format!("row {position} has invalid index '{}': {e}", &row[0]))
    })?;
    Ok(UrlRecord::new(index, &row[1]))
}

fn map_csv_error(err: csv::Error) -> StorageError {
    if err.is_io_error() {
        return StorageError::Io(err.to_string());
    }
    StorageError::InvalidData(err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> StorageError {
    StorageError::Operation(format!("blocking file task failed: {err}"))
}
