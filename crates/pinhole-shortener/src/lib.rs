//! URL shortener service implementation.
//!
//! This crate joins the index store and the codec into the [`Shortener`]
//! contract. Core types are re-exported from `pinhole_core`.
//!
//! [`Shortener`]: pinhole_core::Shortener

pub mod service;

pub use service::ShortenerService;
