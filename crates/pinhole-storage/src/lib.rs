//! Durable media and the index store for Pinhole.
//!
//! [`IndexStore`] owns the allocation counter and serializes appends to a
//! [`RecordLog`][pinhole_core::RecordLog]. [`FileLog`] keeps records in a
//! human-readable delimited file; [`InMemoryLog`] is the volatile variant.

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use file::FileLog;
pub use memory::InMemoryLog;
pub use store::{IndexStore, StoreSettings};
