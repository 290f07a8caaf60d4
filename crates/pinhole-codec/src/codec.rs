use crate::error::CodecError;
use crate::shortcode::ShortCode;

/// Size of the index domain, `62^6`.
pub const DOMAIN_SIZE: u64 = 62 * 62 * 62 * 62 * 62 * 62;

/// The integer nearest to `DOMAIN_SIZE / φ` that is coprime to `DOMAIN_SIZE`.
pub const DEFAULT_MULTIPLIER: u64 = 35_104_476_159;

/// `DEFAULT_MULTIPLIER * DEFAULT_INVERSE ≡ 1 (mod DOMAIN_SIZE)`.
pub const DEFAULT_INVERSE: u64 = 768_306_879;

/// Operands of [`mul_mod`] must stay below this bound.
const OPERAND_LIMIT: u64 = 1 << 36;

/// Scrambles dense indexes into six-character codes and back.
///
/// `encode` computes `K * (index + 1) mod D` and renders it in base62;
/// `decode` runs the same steps backwards with `K⁻¹`. Sequential indexes land
/// far apart in code space, and no two indexes ever share a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    multiplier: u64,
    inverse: u64,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            inverse: DEFAULT_INVERSE,
        }
    }
}

impl Codec {
    /// Creates a codec with a custom multiplier.
    ///
    /// The multiplier must lie in `(0, DOMAIN_SIZE)` and be coprime to
    /// `DOMAIN_SIZE`; its inverse is derived here.
    pub fn with_multiplier(multiplier: u64) -> Result<Self, CodecError> {
        let not_invertible = CodecError::NotInvertible {
            multiplier,
            modulus: DOMAIN_SIZE,
        };
        if multiplier == 0 || multiplier >= DOMAIN_SIZE {
            return Err(not_invertible);
        }
        let inverse = mod_inverse(multiplier, DOMAIN_SIZE).ok_or(not_invertible)?;
        Ok(Self {
            multiplier,
            inverse,
        })
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn inverse(&self) -> u64 {
        self.inverse
    }

    /// Maps an index to its code.
    ///
    /// # Panics
    ///
    /// Panics if `index >= DOMAIN_SIZE`. Callers hand out indexes from a
    /// bounded counter, so an out-of-domain index is a logic error.
    pub fn encode(&self, index: u64) -> ShortCode {
        assert!(
            index < DOMAIN_SIZE,
            "index {index} is outside the code domain [0, {DOMAIN_SIZE})"
        );
        let shifted = (index + 1) % DOMAIN_SIZE;
        let scrambled = mul_mod(shifted, self.multiplier);
        ShortCode::from_value(scrambled)
    }

    /// Maps a code back to its index. Never fails for a parsed [`ShortCode`].
    pub fn decode(&self, code: &ShortCode) -> u64 {
        let scrambled = code.value();
        let shifted = mul_mod(scrambled, self.inverse);
        (shifted + DOMAIN_SIZE - 1) % DOMAIN_SIZE
    }
}

/// Computes `(a * b) mod DOMAIN_SIZE` without overflow.
///
/// # Panics
///
/// Panics if either operand is wider than 36 bits.
fn mul_mod(a: u64, b: u64) -> u64 {
    assert!(
        a < OPERAND_LIMIT && b < OPERAND_LIMIT,
        "mul_mod operands wider than 36 bits: {a} * {b}"
    );
    let product = u128::from(a) * u128::from(b);
    (product % u128::from(DOMAIN_SIZE)) as u64
}

/// Extended Euclid. Returns `None` when `value` and `modulus` share a factor.
fn mod_inverse(value: u64, modulus: u64) -> Option<u64> {
    let (mut old_r, mut r) = (i128::from(value), i128::from(modulus));
    let (mut old_s, mut s) = (1_i128, 0_i128);

    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }

    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(i128::from(modulus)) as u64)
}
