use thiserror::Error;

/// Errors returned while parsing codes or configuring a [`Codec`][crate::Codec].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("multiplier {multiplier} has no inverse modulo {modulus}")]
    NotInvertible { multiplier: u64, modulus: u64 },
}
