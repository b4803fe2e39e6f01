//! Fixed-point decimal fractions in `[0, 1]`.
//!
//! Allocation shares and the per-incentive allocation limit are exact decimal
//! fractions. Floating point is banned from the state machine, so [`Fraction`]
//! stores a `u128` raw value scaled by 10^18 and multiplies against coin
//! amounts with exact floor division (see [`Fraction::mul_floor`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Scale factor: one whole unit is 10^18 raw.
const SCALE: u128 = 1_000_000_000_000_000_000;

/// Maximum supported decimal places when parsing.
const MAX_DECIMALS: usize = 18;

/// Errors produced when constructing or parsing a [`Fraction`].
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum FractionError {
    /// Raw value above 10^18, i.e. a fraction greater than one.
    #[snafu(display("Fraction {raw}e-18 exceeds one"))]
    AboveOne {
        /// The rejected raw value.
        raw: u128,
    },

    /// The textual form was not a decimal number in `[0, 1]`.
    #[snafu(display("'{input}' is not a decimal fraction"))]
    Malformed {
        /// The rejected input.
        input: String,
    },
}

/// An exact decimal fraction in `[0, 1]`, scaled by 10^18.
///
/// Ordering, equality, and hashing follow the raw value, so fractions sort
/// numerically. Arithmetic is checked: sums that would exceed one and
/// differences that would underflow return `None` instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Fraction(u128);

impl Fraction {
    /// The zero fraction.
    pub const ZERO: Self = Self(0);

    /// The whole unit (100%).
    pub const ONE: Self = Self(SCALE);

    /// Creates a fraction from a raw 10^18-scaled value.
    ///
    /// # Errors
    ///
    /// Returns [`FractionError::AboveOne`] if `raw > 10^18`.
    pub const fn from_raw(raw: u128) -> Result<Self, FractionError> {
        if raw > SCALE {
            return Err(FractionError::AboveOne { raw });
        }
        Ok(Self(raw))
    }

    /// Creates a fraction expressing `percent / 100`.
    ///
    /// # Errors
    ///
    /// Returns [`FractionError::AboveOne`] if `percent > 100`.
    pub const fn from_percent(percent: u64) -> Result<Self, FractionError> {
        Self::from_raw(percent as u128 * (SCALE / 100))
    }

    /// Returns the raw 10^18-scaled value.
    #[inline]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Whether this fraction is exactly zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` if the sum exceeds one.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let raw = self.0.checked_add(other.0)?;
        if raw > SCALE {
            return None;
        }
        Some(Self(raw))
    }

    /// Checked subtraction; `None` on underflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiplies an integer amount by this fraction, flooring the result.
    ///
    /// Computes `floor(amount * raw / 10^18)` exactly: with
    /// `amount = q * 10^18 + m`, the product decomposes into
    /// `q * raw + floor(m * raw / 10^18)`. Both terms fit in `u128` because
    /// `raw <= 10^18` bounds the result by `amount`.
    #[must_use]
    pub fn mul_floor(self, amount: u128) -> u128 {
        let q = amount / SCALE;
        let m = amount % SCALE;
        q * self.0 + m * self.0 / SCALE
    }
}

impl fmt::Display for Fraction {
    /// Formats as a decimal with trailing zeros trimmed: `0.05`, `1`, `0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Fraction {
    type Err = FractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FractionError::Malformed {
            input: s.to_string(),
        };

        let (whole_text, frac_text) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole_text.is_empty() && frac_text.is_empty() {
            return Err(malformed());
        }
        if frac_text.len() > MAX_DECIMALS {
            return Err(malformed());
        }

        let whole: u128 = if whole_text.is_empty() {
            0
        } else {
            whole_text.parse().map_err(|_| malformed())?
        };
        let frac: u128 = if frac_text.is_empty() {
            0
        } else {
            frac_text.parse().map_err(|_| malformed())?
        };

        let scale_down = 10u128.pow((MAX_DECIMALS - frac_text.len()) as u32);
        let raw = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac * scale_down))
            .ok_or_else(malformed)?;
        Self::from_raw(raw).map_err(|_| malformed())
    }
}
