//! Core types and traits for the Pinhole URL shortener.
//!
//! This crate provides the record model, the durable-medium contract and
//! the shortener contract shared by the storage, service and gateway crates.

pub mod error;
pub mod record_log;
pub mod shortener;

pub use error::{ShortenerError, StorageError};
pub use pinhole_codec::{Codec, ShortCode, DOMAIN_SIZE};
pub use record_log::{RecordLog, UrlRecord};
pub use shortener::Shortener;
