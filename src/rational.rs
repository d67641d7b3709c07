//! Exact fractions used by TIFF RATIONAL and SRATIONAL fields.
//!
//! A [`RationalNumber`] stores the numerator/denominator pair exactly as it
//! appears in the file. Nothing is ever reduced: `2/4` and `1/2` compare
//! unequal even though they have the same floating point value.

use std::fmt;

/// Number of continued-fraction terms evaluated by [`RationalNumber::from_f64`].
const MAX_TERMS: usize = 64;

/// An exact, unreduced fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RationalNumber {
    pub numerator: i64,
    pub denominator: i64,
}

impl RationalNumber {
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Numerator divided by denominator.
    ///
    /// A zero denominator yields `f64::NAN` rather than a panic or an infinity.
    pub fn to_f64(self) -> f64 {
        if self.denominator == 0 {
            return f64::NAN;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Render for humans: `6` for `6/1`, `1/2` for `1/2`, and `n/0` unchanged
    /// for a zero denominator.
    pub fn to_display_string(self) -> String {
        if self.denominator == 1 {
            self.numerator.to_string()
        } else {
            format!("{}/{}", self.numerator, self.denominator)
        }
    }

    /// Whether both parts fit a TIFF RATIONAL (two unsigned 32-bit integers).
    pub fn fits_unsigned(self) -> bool {
        (0..=u32::MAX as i64).contains(&self.numerator)
            && (0..=u32::MAX as i64).contains(&self.denominator)
    }

    /// Whether both parts fit a TIFF SRATIONAL (two signed 32-bit integers).
    pub fn fits_signed(self) -> bool {
        (i32::MIN as i64..=i32::MAX as i64).contains(&self.numerator)
            && (i32::MIN as i64..=i32::MAX as i64).contains(&self.denominator)
    }

    /// Closest fraction to `value` whose parts fit in 32 bits.
    ///
    /// Uses the continued-fraction expansion of `value`, stopping at the last
    /// convergent whose parts stay in range. Non-negative values produce a
    /// fraction that fits [`fits_unsigned`](Self::fits_unsigned), negative
    /// values one that fits [`fits_signed`](Self::fits_signed). Non-finite
    /// input maps to `0/0`.
    pub fn from_f64(value: f64) -> Self {
        let limit = if value < 0.0 {
            i32::MAX as i64
        } else {
            u32::MAX as i64
        };
        Self::approximate(value, limit)
    }

    /// Like [`from_f64`](Self::from_f64), but always within the SRATIONAL range.
    pub fn from_f64_signed(value: f64) -> Self {
        Self::approximate(value, i32::MAX as i64)
    }

    fn approximate(value: f64, limit: i64) -> Self {
        if !value.is_finite() {
            return Self::new(0, 0);
        }

        let negative = value < 0.0;
        let magnitude = value.abs();

        if magnitude >= limit as f64 {
            let numerator = if negative { -limit } else { limit };
            return Self::new(numerator, 1);
        }

        // Convergents h(n)/k(n) of the continued fraction.
        let (mut h_prev, mut h) = (1i64, magnitude.floor() as i64);
        let (mut k_prev, mut k) = (0i64, 1i64);
        let mut remainder = magnitude - magnitude.floor();

        for _ in 0..MAX_TERMS {
            if remainder < 1e-12 || (h as f64 / k as f64 - magnitude).abs() < f64::EPSILON {
                break;
            }
            let inverse = 1.0 / remainder;
            let term = inverse.floor() as i64;
            remainder = inverse - inverse.floor();

            let h_next = term.saturating_mul(h).saturating_add(h_prev);
            let k_next = term.saturating_mul(k).saturating_add(k_prev);
            if h_next > limit || k_next > limit {
                break;
            }
            h_prev = h;
            h = h_next;
            k_prev = k;
            k = k_next;
        }

        let numerator = if negative { -h } else { h };
        Self::new(numerator, k)
    }
}

impl fmt::Display for RationalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<(u32, u32)> for RationalNumber {
    fn from((numerator, denominator): (u32, u32)) -> Self {
        Self::new(numerator as i64, denominator as i64)
    }
}

impl From<(i32, i32)> for RationalNumber {
    fn from((numerator, denominator): (i32, i32)) -> Self {
        Self::new(numerator as i64, denominator as i64)
    }
}
