//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  On a jewellery bill:                                                   │
//! │    10.575 g × Rs 6,245/g = Rs 66,040.875 → floats drift per machine    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    10575 mg × 624500 paise/g = 6604087500 / 1000 → 6604088 paise       │
//! │    One rounding point, half-up, identical on every platform            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sona_core::money::Money;
//!
//! // Create from paise (preferred)
//! let price = Money::from_paise(109_900); // Rs 1,099.00
//!
//! // Arithmetic operations
//! let doubled = price * 2;                     // Rs 2,198.00
//! let total = price + Money::from_paise(500);  // Rs 1,104.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(1099.0); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for deductions and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Rate.rate_paise ──► metal value ──► making charge ──► LineItem.total  │
/// │                                                                         │
/// │  Bill.subtotal ──► + GST breakup ──► Bill.total ──► amount in words    │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let price = Money::from_paise(109_900); // Represents Rs 1,099.00
    /// assert_eq!(price.paise(), 109_900);
    /// ```
    ///
    /// ## Why Paise?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The database, calculations, and bill totals all use paise.
    /// Only display formatting converts to rupees.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let rate = Money::from_rupees(6_000); // Rs 6,000.00
    /// assert_eq!(rate.paise(), 600_000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Creates a Money value from major and minor units (rupees and paise).
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let price = Money::from_rupees_paise(10, 50); // Rs 10.50
    /// assert_eq!(price.paise(), 1050);
    ///
    /// let deduction = Money::from_rupees_paise(-5, 50); // Rs -5.50
    /// assert_eq!(deduction.paise(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_rupees_paise(-5, 50)` = Rs -5.50, not Rs -4.50
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        // Handle sign: if rupees is negative, paise should subtract
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise (smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let price = Money::from_paise(1050);
    /// assert_eq!(price.paise(), 1050);
    /// ```
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion, truncated toward zero.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let price = Money::from_paise(1050);
    /// assert_eq!(price.rupees(), 10);
    ///
    /// let deduction = Money::from_paise(-550);
    /// assert_eq!(deduction.rupees(), -5);
    /// ```
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (paise) portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let price = Money::from_paise(1050);
    /// assert_eq!(price.paise_part(), 50);
    ///
    /// let deduction = Money::from_paise(-550);
    /// assert_eq!(deduction.paise_part(), 50); // Absolute value
    /// ```
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let zero = Money::zero();
    /// assert_eq!(zero.paise(), 0);
    /// assert!(zero.is_zero());
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let deduction = Money::from_paise(-550);
    /// assert_eq!(deduction.abs().paise(), 550);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of this value and zero.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// // A discount larger than the raw making charge floors at zero
    /// let after_discount = Money::from_paise(-2_500);
    /// assert_eq!(after_discount.clamp_at_zero(), Money::zero());
    /// ```
    #[inline]
    pub const fn clamp_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Calculates a percentage of this amount, given in basis points.
    ///
    /// ## Basis Points
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  1 bps = 0.01%     100 bps = 1%     1000 bps = 10%                  │
    /// │                                                                     │
    /// │  Making charge 10%      → 1000 bps                                  │
    /// │  Exchange deduction 3%  →  300 bps                                  │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// The intermediate product is widened to i128 to prevent overflow on
    /// large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use sona_core::money::Money;
    ///
    /// let metal_value = Money::from_rupees(60_000);
    /// let making = metal_value.calculate_percentage(1000); // 10%
    /// assert_eq!(making, Money::from_rupees(6_000));
    ///
    /// // Half-up rounding: 3% of Rs 660.00 = Rs 19.80 exactly,
    /// // 3% of 666.50 = 19.995 → Rs 20.00
    /// let deduction = Money::from_paise(66_650).calculate_percentage(300);
    /// assert_eq!(deduction.paise(), 2_000);
    /// ```
    pub fn calculate_percentage(&self, rate_bps: i64) -> Money {
        // Use i128 to prevent overflow on large amounts
        // Formula: amount_paise * bps / 10000
        // With half-up rounding: (amount_paise * bps + 5000) / 10000
        let paise = (self.0 as i128 * rate_bps as i128 + 5000) / 10000;
        Money::from_paise(paise as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log output. Printed bills format amounts
/// separately to handle grouping and localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}Rs {}.{:02}",
            sign,
            self.rupees().abs(),
            self.paise_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
