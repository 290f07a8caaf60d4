use async_trait::async_trait;
use pinhole_core::{Codec, RecordLog, ShortCode, Shortener, ShortenerError, UrlRecord};
use pinhole_storage::{IndexStore, StoreError};
use tracing::{debug, error, warn};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps an `IndexStore` and a `Codec`:
/// - shortening allocates the next index and encodes it
/// - resolving decodes the code and reads the record back
///
/// Codes are collision-free by construction, so no retry is ever needed.
pub struct ShortenerService<L: RecordLog> {
    store: IndexStore<L>,
    codec: Codec,
}

impl<L: RecordLog> Clone for ShortenerService<L> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            codec: self.codec,
        }
    }
}

impl<L: RecordLog> ShortenerService<L> {
    /// Creates a service with the default codec.
    pub fn new(store: IndexStore<L>) -> Self {
        Self::with_codec(store, Codec::default())
    }

    /// Creates a service with a custom codec.
    ///
    /// Changing the codec of an existing deployment changes every issued code.
    pub fn with_codec(store: IndexStore<L>, codec: Codec) -> Self {
        Self { store, codec }
    }

    pub fn store(&self) -> &IndexStore<L> {
        &self.store
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

#[async_trait]
impl<L: RecordLog> Shortener for ShortenerService<L> {
    async fn shorten(&self, original_url: &str) -> Result<ShortCode, ShortenerError> {
        if original_url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let index = self
            .store
            .allocate(original_url)
            .await
            .map_err(store_to_shortener_error)?;
        let code = self.codec.encode(index);
        debug!(index, code = %code, "shortened url");
        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord, ShortenerError> {
        let index = self.codec.decode(code);
        if index >= self.store.allocated() {
            debug!(index, code = %code, "code refers to an unallocated index");
            return Err(ShortenerError::OutOfRange(index));
        }

        self.store
            .lookup(index)
            .await
            .map_err(store_to_shortener_error)
    }

    fn allocated(&self) -> u64 {
        self.store.allocated()
    }
}

/// Converts a StoreError to a ShortenerError.
fn store_to_shortener_error(e: StoreError) -> ShortenerError {
    match e {
        StoreError::EmptyUrl => ShortenerError::InvalidUrl(e.to_string()),
        StoreError::NotFound(index) => ShortenerError::NotFound(index),
        StoreError::DomainExhausted { .. } => {
            warn!(error = %e, "rejecting shorten request");
            ShortenerError::DomainExhausted
        }
        StoreError::Corrupted { .. } => {
            error!(error = %e, "corrupted record");
            ShortenerError::Corrupted(e.to_string())
        }
        other => {
            error!(error = %other, "storage failure");
            ShortenerError::Storage(other.to_string())
        }
    }
}
