//! # Amount in Words
//!
//! Renders a [`Money`] amount as Indian-numbering-system words for the
//! printed bill, e.g. `Rs 1,34,000.00` → `"One Lakh Thirty Four Thousand
//! Rupees Only"`.
//!
//! ## Indian Grouping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   western:   12,345,678                                                 │
//! │   indian:   1,23,45,678  =  1 Crore  23 Lakh  45 Thousand  678          │
//! │                                                                         │
//! │   Crore    = 1,00,00,000  (10^7)                                        │
//! │   Lakh     =    1,00,000  (10^5)                                        │
//! │   Thousand =        1,000                                               │
//! │                                                                         │
//! │   Crore counts above 99 recurse: 123 Crore → "One Hundred Twenty       │
//! │   Three Crore ..."                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Total over every `Money`: the rupee part is truncated from paise, the
//! paise part is rendered as an `"and N Paise"` clause, every result ends in
//! `"Only"`, and zero is `"Zero Rupees Only"`. Negative amounts (never on a
//! real bill) get a `"Minus "` prefix rather than panicking.

use crate::money::Money;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Words for 1..=99. Never called with zero.
fn two_digits(n: i64) -> String {
    debug_assert!((1..=99).contains(&n));
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

/// Words for 1..=999. Never called with zero.
fn three_digits(n: i64) -> String {
    debug_assert!((1..=999).contains(&n));
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => two_digits(r),
        (h, 0) => format!("{} Hundred", ONES[h as usize]),
        (h, r) => format!("{} Hundred {}", ONES[h as usize], two_digits(r)),
    }
}

/// Words for any non-negative integer, Indian grouping.
fn integer_words(n: i64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let crore = n / 10_000_000;
    let rem = n % 10_000_000;
    let lakh = rem / 100_000;
    let thousand = (rem % 100_000) / 1_000;
    let below_thousand = rem % 1_000;

    let mut parts: Vec<String> = Vec::with_capacity(4);
    if crore > 0 {
        // Recursion carries 100+ crore: 123 → "One Hundred Twenty Three Crore"
        parts.push(format!("{} Crore", integer_words(crore)));
    }
    if lakh > 0 {
        parts.push(format!("{} Lakh", two_digits(lakh)));
    }
    if thousand > 0 {
        parts.push(format!("{} Thousand", two_digits(thousand)));
    }
    if below_thousand > 0 {
        parts.push(three_digits(below_thousand));
    }
    parts.join(" ")
}

/// Renders a money amount as bill-ready words.
///
/// ## Example
/// ```rust
/// use sona_core::money::Money;
/// use sona_core::words::amount_in_words;
///
/// assert_eq!(
///     amount_in_words(Money::from_rupees(134_000)),
///     "One Lakh Thirty Four Thousand Rupees Only"
/// );
/// assert_eq!(amount_in_words(Money::zero()), "Zero Rupees Only");
/// assert_eq!(
///     amount_in_words(Money::from_paise(50)),
///     "Zero Rupees and Fifty Paise Only"
/// );
/// ```
pub fn amount_in_words(amount: Money) -> String {
    let prefix = if amount.is_negative() { "Minus " } else { "" };
    let abs = amount.abs();
    let rupees = abs.rupees();
    let paise = abs.paise_part();

    if paise > 0 {
        format!(
            "{}{} Rupees and {} Paise Only",
            prefix,
            integer_words(rupees),
            integer_words(paise)
        )
    } else {
        format!("{}{} Rupees Only", prefix, integer_words(rupees))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================


// =============================================================================
// Property Tests
// =============================================================================
