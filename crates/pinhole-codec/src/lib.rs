//! Bijective mapping between dense integer indexes and six-character codes.
//!
//! The transform is a single affine map over `Z/D` (`D = 62^6`) followed by
//! a fixed-width base62 rendering, so every index in `[0, D)` has exactly one
//! code and every code maps back to exactly one index.

mod codec;
pub mod error;
mod shortcode;

pub use codec::{Codec, DEFAULT_INVERSE, DEFAULT_MULTIPLIER, DOMAIN_SIZE};
pub use error::CodecError;
pub use shortcode::{ShortCode, CODE_LENGTH};
