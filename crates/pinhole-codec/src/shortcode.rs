use crate::codec::DOMAIN_SIZE;
use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;
use std::str::FromStr;

/// Number of characters in every short code.
pub const CODE_LENGTH: usize = 6;

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: u64 = ALPHABET.len() as u64;

/// A validated six-character code over `[0-9a-zA-Z]`.
///
/// The only ways to obtain one are [`ShortCode::parse`] (untrusted input) and
/// [`Codec::encode`][crate::Codec::encode], so holders never need to
/// re-validate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Parses an untrusted string into a `ShortCode`.
    ///
    /// The input must be exactly [`CODE_LENGTH`] ASCII digits or letters.
    pub fn parse(code: impl AsRef<str>) -> Result<Self, CodecError> {
        let code = code.as_ref();
        if code.len() != CODE_LENGTH {
            return Err(CodecError::InvalidShortCode(format!(
                "length must be {}, got {}",
                CODE_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(|b| digit_value(b).is_some()) {
            return Err(CodecError::InvalidShortCode(format!(
                "must contain only ASCII letters and digits: '{}'",
                code
            )));
        }

        Ok(Self(SmolStr::new(code)))
    }

    /// Renders `value` as six base62 digits, most significant first.
    pub(crate) fn from_value(mut value: u64) -> Self {
        debug_assert!(value < DOMAIN_SIZE);
        let mut digits = [b'0'; CODE_LENGTH];
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(value % BASE) as usize];
            value /= BASE;
        }
        // every byte comes from ALPHABET, which is ASCII
        let text = std::str::from_utf8(&digits).unwrap_or_default();
        Self(SmolStr::new(text))
    }

    /// Reads the code back as a base62 number.
    pub(crate) fn value(&self) -> u64 {
        self.0.bytes().fold(0, |acc, b| match digit_value(b) {
            Some(digit) => acc * BASE + digit,
            None => unreachable!("short code holds a byte outside the alphabet"),
        })
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }
}

fn digit_value(byte: u8) -> Option<u64> {
    let digit = match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'z' => byte - b'a' + 10,
        b'A'..=b'Z' => byte - b'A' + 36,
        _ => return None,
    };
    Some(u64::from(digit))
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShortCode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ShortCode {
    type Error = CodecError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}
