//! # Validation Module
//!
//! Input validation utilities for Sona POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Counter UI                                                   │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate operator feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by pricing and the billing service)      │
//! │  ├── Item geometry (gross ≥ less ≥ 0, rate > 0)                        │
//! │  └── Business rule validation before any money math                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (bill number, SKU triple)                      │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sona_core::validation::{validate_weights, validate_quantity};
//!
//! // Gross must cover the less deduction
//! assert!(validate_weights(10_000, 2_500).is_ok());
//! assert!(validate_weights(2_500, 10_000).is_err());
//!
//! // Zero quantity is allowed (weight-only lines); negative is not
//! assert!(validate_quantity(0).is_ok());
//! assert!(validate_quantity(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::MakingCharge;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
///
/// ## Example
/// ```rust
/// use sona_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Gold Ring 22K").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product_name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "product_name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a purity label.
///
/// ## Rules
/// - Must not be empty (it keys the rate lookup and the SKU triple)
/// - Must be at most 20 characters ("22K", "99.9%", "VVS1")
pub fn validate_purity(purity: &str) -> ValidationResult<()> {
    let purity = purity.trim();

    if purity.is_empty() {
        return Err(ValidationError::Required {
            field: "purity".to_string(),
        });
    }

    if purity.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "purity".to_string(),
            max: 20,
        });
    }

    Ok(())
}

/// Validates the customer name on a bill.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".to_string(),
        });
    }

    if name.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: 120,
        });
    }

    Ok(())
}

/// Validates the customer phone number on a bill.
///
/// ## Rules
/// - Must not be empty (the shop's customer lookup keys on phone)
/// - Digits, spaces, `+` and `-` only, at most 20 characters
pub fn validate_customer_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_phone".to_string(),
        });
    }

    if phone.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "customer_phone".to_string(),
            max: 20,
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain only digits, spaces, + and -".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Item Geometry Validators
// =============================================================================

/// Validates the gross/less weight pair of an item.
///
/// ## Rules
/// - Both must be non-negative milligrams
/// - `gross >= less`, so the net weight can never be negative
///
/// Runs before any monetary computation; a bad pair never reaches the
/// pricing maths.
pub fn validate_weights(gross_mg: i64, less_mg: i64) -> ValidationResult<()> {
    if gross_mg < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "gross_weight".to_string(),
        });
    }

    if less_mg < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "less_weight".to_string(),
        });
    }

    if less_mg > gross_mg {
        return Err(ValidationError::Inconsistent {
            field: "less_weight".to_string(),
            reason: "exceeds gross weight".to_string(),
        });
    }

    Ok(())
}

/// Validates an item quantity.
///
/// ## Rules
/// - Must be non-negative
/// - Zero is allowed: weight-only lines (loose stones, old gold sweepings)
///   carry no piece count
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a metal rate.
///
/// ## Rules
/// - Must be strictly positive; a zero or negative rate means the day's
///   rate was never entered, and pricing on it would silently produce a
///   worthless bill
pub fn validate_rate(rate: Money) -> ValidationResult<()> {
    if !rate.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "rate".to_string(),
        });
    }

    Ok(())
}

/// Validates a making-charge policy value.
///
/// ## Rules
/// - The policy value must be non-negative, whatever the kind
pub fn validate_making_charge(charge: &MakingCharge) -> ValidationResult<()> {
    if charge.value() < 0 {
        let field = match charge {
            MakingCharge::Fixed { .. } => "making_charge_amount",
            MakingCharge::Percent { .. } => "making_charge_rate_bps",
            MakingCharge::PerGram { .. } => "making_charge_per_gram",
        };
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a paise amount that must be zero or more
/// (discounts, other charges, GST components).
pub fn validate_non_negative_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use sona_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
