//! HTTP boundary for the Pinhole URL shortener.
//!
//! Validates inbound codes and URLs, calls the [`Shortener`], and turns its
//! outcomes into redirects, pages and JSON.
//!
//! [`Shortener`]: pinhole_core::Shortener

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
