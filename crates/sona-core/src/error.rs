//! # Error Types
//!
//! Domain-specific error types for sona-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sona-core errors (this file)                                          │
//! │  ├── CoreError        - Billing/pricing domain errors                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sona-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── BillingError     - Orchestration failures (create/update/delete)  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError → Caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (metal type, purity, field name)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No rate is on record for a metal type + purity pair.
    ///
    /// ## When This Occurs
    /// - An item is billed before the day's rate has been entered
    /// - A purity string was mistyped ("22k" vs "22K")
    ///
    /// ## User Workflow
    /// ```text
    /// Add item (Gold, "23K")
    ///      │
    ///      ▼
    /// Rate lookup: only "22K" and "24K" on record
    ///      │
    ///      ▼
    /// RateNotFound { metal_type: Gold, purity: "23K" }
    ///      │
    ///      ▼
    /// UI shows: "Enter today's Gold 23K rate first"
    /// ```
    #[error("No rate on record for {metal_type} {purity}")]
    RateNotFound { metal_type: String, purity: String },

    /// A bill must carry at least one item.
    ///
    /// ## When This Occurs
    /// - Finalizing a bill after every line was removed
    /// - An update request arrives with an empty item list
    #[error("Bill must contain at least one item")]
    EmptyBill,

    /// Bill has exceeded the maximum allowed items.
    #[error("Bill cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before pricing runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Two fields are inconsistent with each other.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },

    /// Invalid format (e.g., malformed bill number, bad phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
