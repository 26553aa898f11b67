//! # Weight Module
//!
//! Provides the `Weight` type for handling metal weights safely.
//!
//! ## Why Integer Milligrams?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Jewellery scales read to 0.001 g. Storing grams as floats loses       │
//! │  exactly the digits the scale guarantees:                              │
//! │                                                                        │
//! │    10.575 g  as f64 → 10.574999999999999...                            │
//! │    10.575 g  as mg  → 10575 (exact)                                    │
//! │                                                                        │
//! │  Diamond items are weighed in carats; the same scalar stores           │
//! │  milli-carats, and the rate for that metal type is per carat, so the   │
//! │  value formula never changes shape.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is the same doctrine as [`Money`](crate::money::Money): one integer
//! in the smallest unit, one rounding point, no platform drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::money::Money;

// =============================================================================
// Weight Type
// =============================================================================

/// Represents a metal weight in milligrams (or milli-carats for diamond).
///
/// ## Design Decisions
/// - **i64 (signed)**: Subtraction (gross − less) is closed; validation
///   rejects negative results before any money math runs
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Weight(i64);

impl Weight {
    /// Creates a Weight from milligrams.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::weight::Weight;
    ///
    /// let net = Weight::from_milligrams(10_575); // 10.575 g
    /// assert_eq!(net.milligrams(), 10_575);
    /// ```
    #[inline]
    pub const fn from_milligrams(mg: i64) -> Self {
        Weight(mg)
    }

    /// Creates a Weight from whole grams.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::weight::Weight;
    ///
    /// let net = Weight::from_grams(10);
    /// assert_eq!(net.milligrams(), 10_000);
    /// ```
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams * 1000)
    }

    /// Returns the value in milligrams.
    #[inline]
    pub const fn milligrams(&self) -> i64 {
        self.0
    }

    /// Returns the whole-gram portion, truncated toward zero.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::weight::Weight;
    ///
    /// let net = Weight::from_milligrams(10_575);
    /// assert_eq!(net.grams(), 10);
    /// ```
    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns the sub-gram portion in milligrams (always 0-999).
    #[inline]
    pub const fn milligrams_part(&self) -> i64 {
        (self.0 % 1000).abs()
    }

    /// Returns zero weight.
    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies this weight by a per-gram (or per-carat) rate.
    ///
    /// ## Implementation
    /// `mg × paise-per-gram / 1000`, half-up rounded, i128-widened:
    /// `(mg * rate_paise + 500) / 1000`. This is the single rounding point
    /// of the metal-value computation.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    /// use sona_core::weight::Weight;
    ///
    /// // 10.000 g at Rs 6,000/g = Rs 60,000
    /// let value = Weight::from_grams(10).times_rate(Money::from_rupees(6_000));
    /// assert_eq!(value, Money::from_rupees(60_000));
    ///
    /// // 10.575 g at Rs 6,245/g = 6,604,087.5 paise → Rs 66,040.88
    /// let value = Weight::from_milligrams(10_575).times_rate(Money::from_rupees(6_245));
    /// assert_eq!(value.paise(), 6_604_088);
    /// ```
    pub fn times_rate(&self, rate_per_gram: Money) -> Money {
        // Use i128 to prevent overflow on heavy items at high rates
        let paise = (self.0 as i128 * rate_per_gram.paise() as i128 + 500) / 1000;
        Money::from_paise(paise as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows grams to scale precision, e.g. `10.575 g`.
impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:03} g", sign, self.grams().abs(), self.milligrams_part())
    }
}

/// Default weight is zero.
impl Default for Weight {
    fn default() -> Self {
        Weight::zero()
    }
}

/// Addition of two Weight values.
impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Weight values (gross − less = net).
impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Weight::from_grams(10).milligrams(), 10_000);
        assert_eq!(Weight::from_milligrams(10_575).grams(), 10);
        assert_eq!(Weight::from_milligrams(10_575).milligrams_part(), 575);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Weight::from_milligrams(10_575)), "10.575 g");
        assert_eq!(format!("{}", Weight::from_grams(5)), "5.000 g");
        assert_eq!(format!("{}", Weight::from_milligrams(-250)), "-0.250 g");
    }

    #[test]
    fn test_net_weight_subtraction() {
        let gross = Weight::from_milligrams(12_500);
        let less = Weight::from_milligrams(2_500);
        assert_eq!((gross - less).milligrams(), 10_000);

        // Subtraction is closed over negatives; validation rejects them upstream
        assert!((less - gross).is_negative());
    }

    #[test]
    fn test_times_rate_exact() {
        // 10 g at Rs 6,000/g = Rs 60,000 exactly
        let value = Weight::from_grams(10).times_rate(Money::from_rupees(6_000));
        assert_eq!(value, Money::from_rupees(60_000));
    }

    #[test]
    fn test_times_rate_rounds_half_up() {
        // 1 mg at Rs 5.00/g = 0.5 paise → 1 paise
        let value = Weight::from_milligrams(1).times_rate(Money::from_paise(500));
        assert_eq!(value.paise(), 1);

        // 1 mg at Rs 4.99/g = 0.499 paise → 0 paise
        let value = Weight::from_milligrams(1).times_rate(Money::from_paise(499));
        assert_eq!(value.paise(), 0);
    }

    #[test]
    fn test_times_rate_does_not_overflow() {
        // 10 kg of metal at Rs 100,000/g — beyond any real bill, still exact
        let value = Weight::from_grams(10_000).times_rate(Money::from_rupees(100_000));
        assert_eq!(value, Money::from_rupees(1_000_000_000));
    }
}
