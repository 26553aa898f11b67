//! # Bill Number Allocation
//!
//! Daily sequential bill numbers with a persistent per-day counter.
//!
//! ## Allocation Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How A Number Is Allocated                            │
//! │                                                                         │
//! │  next(2024-01-15)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Seed counter row (first call of the day only)                         │
//! │  ├── scan bills LIKE 'SJ/150124/%' descending, 'F…' rows excluded      │
//! │  ├── parse the trailing sequence of the latest number                  │
//! │  └── INSERT INTO bill_sequences ... ON CONFLICT DO NOTHING             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE bill_sequences SET last_seq = last_seq + 1 ... RETURNING       │
//! │  (single statement: concurrent counters serialize on the write lock   │
//! │   and each sees a distinct value)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "SJ/150124/042"                                                       │
//! │                                                                         │
//! │  Any store fault on this path?                                         │
//! │       └── warn! + fallback "SJ/150124/F83921" (is_fallback = true)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Layers Of Defense
//! The counter makes collisions rare; the UNIQUE index on
//! `bills.bill_number` makes them impossible. A bill insert that still
//! loses a race fails with [`crate::DbError::DuplicateBillNumber`] and the
//! billing service allocates again.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::bill::BillRepository;
use sona_core::numbering::{date_key, format_bill_number, format_fallback_number, parse_sequence};

/// The outcome of one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedNumber {
    /// Formatted bill number, e.g. `SJ/150124/042`.
    pub value: String,
    /// True when the sequential path failed and a timestamp-suffixed
    /// number was issued instead. Fallback numbers never join the daily
    /// sequence and are reconciled manually.
    pub is_fallback: bool,
}

/// Allocates daily sequential bill numbers for one shop prefix.
#[derive(Debug, Clone)]
pub struct BillNumberAllocator {
    pool: SqlitePool,
    bills: BillRepository,
    prefix: String,
}

impl BillNumberAllocator {
    /// Creates an allocator for the given shop prefix (e.g. "SJ").
    pub fn new(pool: SqlitePool, prefix: impl Into<String>) -> Self {
        let bills = BillRepository::new(pool.clone());
        BillNumberAllocator {
            pool,
            bills,
            prefix: prefix.into(),
        }
    }

    /// Returns the shop prefix this allocator stamps onto numbers.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Allocates the next bill number for a date.
    ///
    /// Infallible by design: a store fault downgrades to the fallback
    /// number instead of blocking billing. The caller checks
    /// `is_fallback` if it wants to surface the degradation.
    pub async fn next(&self, date: NaiveDate) -> AllocatedNumber {
        match self.next_sequential(date).await {
            Ok(sequence) => AllocatedNumber {
                value: format_bill_number(&self.prefix, date, sequence),
                is_fallback: false,
            },
            Err(e) => {
                let value =
                    format_fallback_number(&self.prefix, date, Utc::now().timestamp_millis());
                warn!(
                    error = %e,
                    fallback = %value,
                    "Sequential allocation failed, issuing fallback bill number"
                );
                AllocatedNumber {
                    value,
                    is_fallback: true,
                }
            }
        }
    }

    /// The primary path: seed the day's counter if absent, then increment.
    async fn next_sequential(&self, date: NaiveDate) -> DbResult<u32> {
        let key = date_key(date);

        // Seed value: the highest already-persisted sequence for the day
        // (fallback numbers excluded by the repository scan).
        let pattern = format!("{}/{}/%", self.prefix, key);
        let latest = self.bills.latest_number_like(&pattern).await?;
        let seed = latest.as_deref().and_then(parse_sequence).unwrap_or(0);

        let mut tx = self.pool.begin().await?;

        // First statement is a write, so the transaction takes the write
        // lock up front; no read-then-write upgrade window.
        sqlx::query(
            r#"
            INSERT INTO bill_sequences (prefix, date_key, last_seq)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (prefix, date_key) DO NOTHING
            "#,
        )
        .bind(&self.prefix)
        .bind(&key)
        .bind(seed as i64)
        .execute(&mut *tx)
        .await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            UPDATE bill_sequences
            SET last_seq = last_seq + 1
            WHERE prefix = ?1 AND date_key = ?2
            RETURNING last_seq
            "#,
        )
        .bind(&self.prefix)
        .bind(&key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(prefix = %self.prefix, date_key = %key, sequence, "Allocated bill sequence");
        Ok(sequence as u32)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
