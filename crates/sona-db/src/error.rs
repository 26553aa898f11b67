//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── DuplicateBillNumber ← retried by the allocator caller        │
//! │       ├── Conflict            ← retried by the stock synchronizer      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillingError (billing.rs) ← Adds bill-level context                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - UPDATE/DELETE matched zero rows
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting duplicate stock SKU (metal + purity + product name)
    /// - Duplicate rate for a metal/purity pair
    /// - Any UNIQUE index violation other than bill numbers
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation {
        field: String,
        value: String,
    },

    /// Two writers raced to the same bill number.
    ///
    /// ## When This Occurs
    /// - Concurrent bill creation on the same date lands on the same
    ///   sequence before either commit, and the UNIQUE index on
    ///   `bills.bill_number` rejects the loser.
    ///
    /// ## Recovery
    /// Retryable: allocate a fresh number and insert again.
    #[error("Bill number '{bill_number}' was taken by a concurrent writer")]
    DuplicateBillNumber {
        bill_number: String,
    },

    /// Optimistic lock failure on a versioned row.
    ///
    /// ## When This Occurs
    /// - A stock record was modified between read and conditional write
    ///   (the version column no longer matches).
    ///
    /// ## Recovery
    /// Retryable: re-read the row and reapply the change.
    #[error("Concurrent modification of {entity} '{id}', reload and retry")]
    Conflict {
        entity: String,
        id: String,
    },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent bill_id from bill_items
    /// - Referencing a non-existent stock_record_id from stock_transactions
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
    },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in migration
    /// - Migration version conflict
    /// - Schema incompatibility
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a Conflict error for a versioned row.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether retrying the operation can succeed without operator action.
    ///
    /// ## Usage
    /// Callers loop on `is_retryable()` errors with a bounded attempt count;
    /// everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateBillNumber { .. } | DbError::Conflict { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
///   UNIQUE on bill_number     → DbError::DuplicateBillNumber (retryable)
///   UNIQUE elsewhere          → DbError::UniqueViolation
///   FOREIGN KEY               → DbError::ForeignKeyViolation
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    // Parse the field name from the error message
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();

                    // Bill number collisions get their own retryable variant;
                    // the value is unknown at this level so the caller fills it
                    // from the number it tried to insert.
                    if field.starts_with("bills.bill_number") {
                        DbError::DuplicateBillNumber {
                            bill_number: "unknown".to_string(),
                        }
                    } else {
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DbError::not_found("Bill", "abc-123");
        assert_eq!(err.to_string(), "Bill not found: abc-123");
    }

    #[test]
    fn test_duplicate_bill_number_is_retryable() {
        let err = DbError::DuplicateBillNumber {
            bill_number: "SJ/150124/001".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err = DbError::conflict("StockRecord", "abc");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!DbError::not_found("Bill", "x").is_retryable());
        assert!(!DbError::PoolExhausted.is_retryable());
    }
}
