use crate::error::ShortenerError;
use crate::record_log::UrlRecord;
use async_trait::async_trait;
use pinhole_codec::ShortCode;

type Result<T> = std::result::Result<T, ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Stores `original_url` under a fresh index and returns its short code.
    ///
    /// Shortening the same URL twice yields two different codes.
    async fn shorten(&self, original_url: &str) -> Result<ShortCode>;

    /// Resolves a short code to its stored record.
    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord>;

    /// Number of indexes handed out so far.
    fn allocated(&self) -> u64;
}
