//! # Bill Number Format
//!
//! Pure formatting and parsing of bill numbers. Allocation (the next-number
//! decision against the store) lives in sona-db; this module only knows the
//! textual format.
//!
//! ## Format (bit-exact)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   SJ / 150124 / 001                                                     │
//! │   ──   ──────   ───                                                     │
//! │   shop  DDMMYY  3-digit zero-padded sequence, restarts daily           │
//! │   code                                                                  │
//! │                                                                         │
//! │   Fallback (allocation store fault):                                    │
//! │   SJ / 150124 / F12345                                                  │
//! │                 ──────                                                  │
//! │                 'F' + 5 timestamp-derived digits; visually distinct,   │
//! │                 never parses as a sequence number                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Zero-padding makes string-descending order agree with numeric order
//! within a day (up to 999 bills), which is what the allocator's
//! `LIKE 'SJ/150124/%' ORDER BY ... DESC` lookup relies on.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Width of the zero-padded daily sequence.
const SEQUENCE_WIDTH: usize = 3;

/// Width of the fallback suffix after the `F` marker.
const FALLBACK_WIDTH: usize = 5;

// =============================================================================
// Formatting
// =============================================================================

/// The fixed-width `DDMMYY` date segment.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use sona_core::numbering::date_key;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(date_key(date), "050124");
/// ```
pub fn date_key(date: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}",
        date.day(),
        date.month(),
        date.year() % 100
    )
}

/// Formats a sequential bill number: `PREFIX/DDMMYY/NNN`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use sona_core::numbering::format_bill_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(format_bill_number("SJ", date, 1), "SJ/150124/001");
/// assert_eq!(format_bill_number("SJ", date, 42), "SJ/150124/042");
/// ```
pub fn format_bill_number(prefix: &str, date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}/{}/{:0width$}",
        prefix,
        date_key(date),
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Formats a fallback bill number: `PREFIX/DDMMYY/FNNNNN`.
///
/// Used when the allocation store is unavailable; the suffix is derived from
/// a millisecond timestamp so near-simultaneous fallbacks still differ, and
/// the `F` marker keeps it from ever colliding with (or parsing as) a
/// sequential number.
pub fn format_fallback_number(prefix: &str, date: NaiveDate, timestamp_ms: i64) -> String {
    let suffix = (timestamp_ms.unsigned_abs() % 100_000) as u32;
    format!(
        "{}/{}/F{:0width$}",
        prefix,
        date_key(date),
        suffix,
        width = FALLBACK_WIDTH
    )
}

// =============================================================================
// Parsing
// =============================================================================

/// A bill number split into its segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillNumber {
    pub prefix: String,
    /// The `DDMMYY` segment, kept textual (it is a key, not a date value).
    pub date_key: String,
    /// The daily sequence; `None` for fallback numbers.
    pub sequence: Option<u32>,
}

impl BillNumber {
    /// Parses a bill number. Returns `None` for anything that is not
    /// `PREFIX/DDMMYY/NNN` or `PREFIX/DDMMYY/FNNNNN`.
    pub fn parse(raw: &str) -> Option<BillNumber> {
        let mut segments = raw.split('/');
        let prefix = segments.next()?;
        let date_key = segments.next()?;
        let tail = segments.next()?;
        if segments.next().is_some() {
            return None;
        }

        if prefix.is_empty()
            || date_key.len() != 6
            || !date_key.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let sequence = if let Some(fallback) = tail.strip_prefix('F') {
            if fallback.len() != FALLBACK_WIDTH || !fallback.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            None
        } else {
            // Sequences past 999 widen beyond 3 digits; still accepted
            if tail.len() < SEQUENCE_WIDTH || !tail.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(tail.parse().ok()?)
        };

        Some(BillNumber {
            prefix: prefix.to_string(),
            date_key: date_key.to_string(),
            sequence,
        })
    }

    /// Whether this is a fallback (timestamp-suffixed) number.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.sequence.is_none()
    }
}

/// The daily sequence of a bill number, if it is a well-formed sequential
/// number. The allocator uses this to increment from the latest bill.
///
/// ## Example
/// ```rust
/// use sona_core::numbering::parse_sequence;
///
/// assert_eq!(parse_sequence("SJ/150124/007"), Some(7));
/// assert_eq!(parse_sequence("SJ/150124/F12345"), None); // fallback
/// assert_eq!(parse_sequence("garbage"), None);
/// ```
pub fn parse_sequence(bill_number: &str) -> Option<u32> {
    BillNumber::parse(bill_number)?.sequence
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key_is_fixed_width() {
        assert_eq!(date_key(date(2024, 1, 5)), "050124");
        assert_eq!(date_key(date(2024, 12, 31)), "311224");
        assert_eq!(date_key(date(2030, 6, 9)), "090630");
    }

    #[test]
    fn test_format_zero_pads_sequence() {
        let d = date(2024, 1, 15);
        assert_eq!(format_bill_number("SJ", d, 1), "SJ/150124/001");
        assert_eq!(format_bill_number("SJ", d, 42), "SJ/150124/042");
        assert_eq!(format_bill_number("SJ", d, 999), "SJ/150124/999");
        // Beyond the pad width the number simply widens
        assert_eq!(format_bill_number("SJ", d, 1000), "SJ/150124/1000");
    }

    #[test]
    fn test_parse_round_trip() {
        let d = date(2024, 1, 15);
        let raw = format_bill_number("SJ", d, 7);
        let parsed = BillNumber::parse(&raw).unwrap();

        assert_eq!(parsed.prefix, "SJ");
        assert_eq!(parsed.date_key, "150124");
        assert_eq!(parsed.sequence, Some(7));
        assert!(!parsed.is_fallback());
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("SJ/150124/007"), Some(7));
        assert_eq!(parse_sequence("SJ/150124/999"), Some(999));
        assert_eq!(parse_sequence("SJ/150124/1000"), Some(1000));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(BillNumber::parse(""), None);
        assert_eq!(BillNumber::parse("SJ/150124"), None);
        assert_eq!(BillNumber::parse("SJ/150124/001/extra"), None);
        assert_eq!(BillNumber::parse("SJ/15Jan24/001"), None);
        assert_eq!(BillNumber::parse("SJ/150124/ABC"), None);
        assert_eq!(BillNumber::parse("/150124/001"), None);
        // Too-short date or sequence segments
        assert_eq!(BillNumber::parse("SJ/1501/001"), None);
        assert_eq!(BillNumber::parse("SJ/150124/01"), None);
    }

    #[test]
    fn test_fallback_format_and_parse() {
        let d = date(2024, 1, 15);
        let raw = format_fallback_number("SJ", d, 1_705_312_345_678);
        assert_eq!(raw, "SJ/150124/F45678");

        let parsed = BillNumber::parse(&raw).unwrap();
        assert!(parsed.is_fallback());
        assert_eq!(parsed.sequence, None);

        // A fallback number never contributes to the sequential lookup
        assert_eq!(parse_sequence(&raw), None);
    }

    #[test]
    fn test_fallback_suffix_stays_in_range() {
        let d = date(2024, 1, 15);
        assert_eq!(format_fallback_number("SJ", d, 0), "SJ/150124/F00000");
        assert_eq!(format_fallback_number("SJ", d, 99_999), "SJ/150124/F99999");
        assert_eq!(format_fallback_number("SJ", d, 100_001), "SJ/150124/F00001");
    }

    #[test]
    fn test_string_order_matches_numeric_order_within_pad() {
        let d = date(2024, 1, 15);
        let a = format_bill_number("SJ", d, 9);
        let b = format_bill_number("SJ", d, 10);
        let c = format_bill_number("SJ", d, 999);
        assert!(a < b && b < c);
    }
}
