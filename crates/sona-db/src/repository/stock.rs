//! # Stock Repository
//!
//! Database operations for stock records and their append-only ledger.
//!
//! ## Optimistic Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Versioned Balance Writes                                │
//! │                                                                         │
//! │  Counter A                        Counter B                            │
//! │  ─────────                        ─────────                            │
//! │  read record (version 7)          read record (version 7)              │
//! │  apply_out in memory              apply_out in memory                  │
//! │  UPDATE ... WHERE version = 7     │                                    │
//! │     → 1 row, version becomes 8    │                                    │
//! │                                   UPDATE ... WHERE version = 7         │
//! │                                      → 0 rows → DbError::Conflict      │
//! │                                   reload at version 8, apply again     │
//! │                                                                         │
//! │  The balance UPDATE and its audit-row INSERT share one transaction:    │
//! │  balances are always explicable as the sum of recorded deltas.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ledger Is Append-Only
//! `stock_transactions` rows are never updated or deleted. Reverting a bill
//! writes *inverse* rows; it does not erase history.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sona_core::ledger::LedgerDelta;
use sona_core::{MetalType, StockRecord, StockTransaction, DEFAULT_LOW_STOCK_THRESHOLD};

/// Net applied movement for one stock record under one bill number.
///
/// Summed over the record's audit rows tagged with the bill; the inverse of
/// these figures is exactly what a revert must apply.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillStockDelta {
    pub stock_record_id: String,
    pub quantity_delta: i64,
    pub weight_delta_mg: i64,
}

impl BillStockDelta {
    /// Whether there is anything left to revert.
    pub fn is_zero(&self) -> bool {
        self.quantity_delta == 0 && self.weight_delta_mg == 0
    }
}

/// Repository for stock database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets a stock record by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<StockRecord>> {
        let record = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT
                id, metal_type, purity, product_name,
                quantity, weight_mg,
                cost_price_paise, selling_price_paise,
                low_stock_threshold, is_low_stock, version,
                created_at, updated_at
            FROM stock_records
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets a stock record by its SKU triple.
    pub async fn find_by_key(
        &self,
        metal_type: MetalType,
        purity: &str,
        product_name: &str,
    ) -> DbResult<Option<StockRecord>> {
        let record = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT
                id, metal_type, purity, product_name,
                quantity, weight_mg,
                cost_price_paise, selling_price_paise,
                low_stock_threshold, is_low_stock, version,
                created_at, updated_at
            FROM stock_records
            WHERE metal_type = ?1 AND purity = ?2 AND product_name = ?3
            "#,
        )
        .bind(metal_type)
        .bind(purity)
        .bind(product_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Inserts a new stock record.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU triple already exists
    pub async fn insert(&self, record: &StockRecord) -> DbResult<()> {
        debug!(sku = %record.sku(), "Inserting stock record");

        sqlx::query(
            r#"
            INSERT INTO stock_records (
                id, metal_type, purity, product_name,
                quantity, weight_mg,
                cost_price_paise, selling_price_paise,
                low_stock_threshold, is_low_stock, version,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&record.id)
        .bind(record.metal_type)
        .bind(&record.purity)
        .bind(&record.product_name)
        .bind(record.quantity)
        .bind(record.weight_mg)
        .bind(record.cost_price_paise)
        .bind(record.selling_price_paise)
        .bind(record.low_stock_threshold)
        .bind(record.is_low_stock)
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the record for a SKU triple, creating it with zero balances
    /// when billing touches a SKU the ledger has never seen.
    ///
    /// ## Race Behavior
    /// Two callers creating the same SKU concurrently: the loser's insert
    /// hits the unique index and resolves to the winner's row.
    pub async fn get_or_create(
        &self,
        metal_type: MetalType,
        purity: &str,
        product_name: &str,
    ) -> DbResult<StockRecord> {
        if let Some(existing) = self.find_by_key(metal_type, purity, product_name).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let record = StockRecord {
            id: Uuid::new_v4().to_string(),
            metal_type,
            purity: purity.to_string(),
            product_name: product_name.to_string(),
            quantity: 0,
            weight_mg: 0,
            cost_price_paise: None,
            selling_price_paise: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            // 0 on hand ≤ any sensible threshold
            is_low_stock: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match self.insert(&record).await {
            Ok(()) => Ok(record),
            Err(DbError::UniqueViolation { .. }) => {
                // Lost the creation race; the winner's row is the answer.
                self.find_by_key(metal_type, purity, product_name)
                    .await?
                    .ok_or_else(|| {
                        DbError::not_found(
                            "StockRecord",
                            format!("{}/{}/{}", metal_type, purity, product_name),
                        )
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Persists transitioned balances and their audit row atomically.
    ///
    /// ## Arguments
    /// * `record` - The record **after** an in-memory ledger transition
    /// * `expected_version` - The version the record was read at
    /// * `delta` - The transition outcome to record in the audit trail
    /// * `bill_number` - Bill that triggered the transition, if any
    /// * `note` - Free-text reason for manual transitions
    /// * `recorded_by` - Operator or subsystem name
    ///
    /// ## Returns
    /// * `Ok(StockRecord)` - Fresh row with the bumped version
    /// * `Err(DbError::Conflict)` - Version moved underneath us; reload,
    ///   re-apply the transition, and try again
    pub async fn save_with_transaction(
        &self,
        record: &StockRecord,
        expected_version: i64,
        delta: &LedgerDelta,
        bill_number: Option<&str>,
        note: Option<&str>,
        recorded_by: &str,
    ) -> DbResult<StockRecord> {
        debug!(
            sku = %record.sku(),
            expected_version,
            quantity_delta = delta.quantity_delta,
            weight_delta_mg = delta.weight_delta_mg,
            "Saving stock transition"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE stock_records SET
                quantity = ?3,
                weight_mg = ?4,
                is_low_stock = ?5,
                version = version + 1,
                updated_at = ?6
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(&record.id)
        .bind(expected_version)
        .bind(record.quantity)
        .bind(record.weight_mg)
        .bind(record.is_low_stock)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Uncommitted transaction rolls back on drop.
            return Err(DbError::conflict("StockRecord", &record.id));
        }

        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                id, stock_record_id, kind,
                quantity_delta, weight_delta_mg,
                quantity_requested, weight_requested_mg,
                bill_number, note, recorded_by, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11
            )
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.id)
        .bind(delta.kind)
        .bind(delta.quantity_delta)
        .bind(delta.weight_delta_mg)
        .bind(delta.quantity_requested)
        .bind(delta.weight_requested_mg)
        .bind(bill_number)
        .bind(note)
        .bind(recorded_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(&record.id)
            .await?
            .ok_or_else(|| DbError::not_found("StockRecord", &record.id))
    }

    /// Gets the full audit trail for a stock record, oldest first.
    pub async fn transactions_for(&self, stock_record_id: &str) -> DbResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT
                id, stock_record_id, kind,
                quantity_delta, weight_delta_mg,
                quantity_requested, weight_requested_mg,
                bill_number, note, recorded_by, created_at
            FROM stock_transactions
            WHERE stock_record_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(stock_record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sums the applied deltas per stock record for one bill number.
    ///
    /// ## Why Net, Not Per-Row
    /// A bill that was applied, reverted, and applied again has three rows
    /// per record; the revert needs only the outstanding net effect. Summing
    /// also makes revert idempotent: once inverted, the net is zero and
    /// there is nothing further to undo.
    pub async fn net_deltas_for_bill(&self, bill_number: &str) -> DbResult<Vec<BillStockDelta>> {
        let rows = sqlx::query_as::<_, BillStockDelta>(
            r#"
            SELECT
                stock_record_id,
                COALESCE(SUM(quantity_delta), 0) AS quantity_delta,
                COALESCE(SUM(weight_delta_mg), 0) AS weight_delta_mg
            FROM stock_transactions
            WHERE bill_number = ?1
            GROUP BY stock_record_id
            ORDER BY stock_record_id
            "#,
        )
        .bind(bill_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists all stock records, grouped by metal and purity.
    pub async fn list(&self) -> DbResult<Vec<StockRecord>> {
        let records = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT
                id, metal_type, purity, product_name,
                quantity, weight_mg,
                cost_price_paise, selling_price_paise,
                low_stock_threshold, is_low_stock, version,
                created_at, updated_at
            FROM stock_records
            ORDER BY metal_type, purity, product_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists records at or below their reorder threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<StockRecord>> {
        let records = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT
                id, metal_type, purity, product_name,
                quantity, weight_mg,
                cost_price_paise, selling_price_paise,
                low_stock_threshold, is_low_stock, version,
                created_at, updated_at
            FROM stock_records
            WHERE is_low_stock = 1
            ORDER BY metal_type, purity, product_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Deletes a stock record.
    ///
    /// ## Guard
    /// Only a record that was created by mistake may go: zero balances and
    /// an empty audit trail. Anything with history is permanent - the
    /// ledger stays explicable.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - Record has stock or history
    /// * `Err(DbError::NotFound)` - No such record
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting stock record");

        let result = sqlx::query(
            r#"
            DELETE FROM stock_records
            WHERE id = ?1
              AND quantity = 0
              AND weight_mg = 0
              AND NOT EXISTS (
                  SELECT 1 FROM stock_transactions WHERE stock_record_id = ?1
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if self.find_by_id(id).await?.is_some() {
                return Err(DbError::conflict("StockRecord", id));
            }
            return Err(DbError::not_found("StockRecord", id));
        }

        Ok(())
    }

    /// Changes the reorder threshold and recomputes the low-stock flag.
    pub async fn set_threshold(&self, id: &str, threshold: i64) -> DbResult<StockRecord> {
        debug!(id = %id, threshold, "Setting low-stock threshold");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_records SET
                low_stock_threshold = ?2,
                is_low_stock = CASE WHEN quantity <= ?2 THEN 1 ELSE 0 END,
                version = version + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(threshold)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockRecord", id));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockRecord", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use sona_core::ledger::{apply_in, apply_out};

    async fn setup() -> (Database, StockRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stock();
        (db, stock)
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let (_db, stock) = setup().await;

        let first = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();
        assert_eq!(first.quantity, 0);
        assert_eq!(first.weight_mg, 0);
        assert_eq!(first.version, 0);
        assert!(first.is_low_stock);

        let second = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);

        // A different purity is a different SKU
        let other = stock
            .get_or_create(MetalType::Gold, "18K", "Gold Ring")
            .await
            .unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_stale_version_write_is_rejected() {
        let (_db, stock) = setup().await;
        let record = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();

        let mut staged = record.clone();
        let delta = apply_in(&mut staged, 5, 50_000).unwrap();
        let fresh = stock
            .save_with_transaction(&staged, record.version, &delta, None, None, "tester")
            .await
            .unwrap();
        assert_eq!(fresh.version, record.version + 1);
        assert_eq!(fresh.quantity, 5);

        // A second write still claiming the old version must conflict
        let mut stale = record.clone();
        let delta = apply_in(&mut stale, 1, 10_000).unwrap();
        let err = stock
            .save_with_transaction(&stale, record.version, &delta, None, None, "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(err.is_retryable());

        // The rejected write left neither balances nor an audit row behind
        let current = stock.find_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 5);
        assert_eq!(stock.transactions_for(&record.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_audit_rows_keep_requested_and_applied() {
        let (_db, stock) = setup().await;
        let mut record = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();

        // Out of empty stock: applied clamps to zero, request is preserved
        let version = record.version;
        let delta = apply_out(&mut record, 3, 30_000).unwrap();
        stock
            .save_with_transaction(&record, version, &delta, Some("SJ/150124/001"), None, "tester")
            .await
            .unwrap();

        let rows = stock.transactions_for(&record.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_delta, 0);
        assert_eq!(rows[0].weight_delta_mg, 0);
        assert_eq!(rows[0].quantity_requested, 3);
        assert_eq!(rows[0].weight_requested_mg, 30_000);
        assert_eq!(rows[0].bill_number.as_deref(), Some("SJ/150124/001"));
    }

    #[tokio::test]
    async fn test_net_deltas_sum_per_bill() {
        let (_db, stock) = setup().await;
        let mut record = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();

        // Opening stock, not tied to any bill
        let version = record.version;
        let delta = apply_in(&mut record, 10, 100_000).unwrap();
        let mut record = stock
            .save_with_transaction(&record, version, &delta, None, Some("opening"), "tester")
            .await
            .unwrap();

        // Two movements under one bill, one under another
        let version = record.version;
        let delta = apply_out(&mut record, 2, 20_000).unwrap();
        let mut record = stock
            .save_with_transaction(&record, version, &delta, Some("SJ/150124/001"), None, "tester")
            .await
            .unwrap();
        let version = record.version;
        let delta = apply_out(&mut record, 1, 10_000).unwrap();
        let mut record = stock
            .save_with_transaction(&record, version, &delta, Some("SJ/150124/001"), None, "tester")
            .await
            .unwrap();
        let version = record.version;
        let delta = apply_out(&mut record, 4, 40_000).unwrap();
        stock
            .save_with_transaction(&record, version, &delta, Some("SJ/150124/002"), None, "tester")
            .await
            .unwrap();

        let nets = stock.net_deltas_for_bill("SJ/150124/001").await.unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].quantity_delta, -3);
        assert_eq!(nets[0].weight_delta_mg, -30_000);

        assert!(stock
            .net_deltas_for_bill("SJ/999999/999")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_guards_history() {
        let (_db, stock) = setup().await;

        // A record created by mistake (no balances, no history) may go
        let virgin = stock
            .get_or_create(MetalType::Gold, "22K", "Mistyped Ring")
            .await
            .unwrap();
        stock.delete(&virgin.id).await.unwrap();
        assert!(stock.find_by_id(&virgin.id).await.unwrap().is_none());

        // Anything with ledger history is permanent
        let mut used = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();
        let version = used.version;
        let delta = apply_in(&mut used, 1, 10_000).unwrap();
        stock
            .save_with_transaction(&used, version, &delta, None, None, "tester")
            .await
            .unwrap();

        let err = stock.delete(&used.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let err = stock.delete("no-such-id").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_threshold_recomputes_flag() {
        let (_db, stock) = setup().await;
        let mut record = stock
            .get_or_create(MetalType::Silver, "92.5", "Payal")
            .await
            .unwrap();

        let version = record.version;
        let delta = apply_in(&mut record, 5, 250_000).unwrap();
        let record = stock
            .save_with_transaction(&record, version, &delta, None, None, "tester")
            .await
            .unwrap();
        // Default threshold 5: exactly at the boundary counts as low
        assert!(record.is_low_stock);

        let relaxed = stock.set_threshold(&record.id, 2).await.unwrap();
        assert_eq!(relaxed.low_stock_threshold, 2);
        assert!(!relaxed.is_low_stock);
        assert_eq!(relaxed.version, record.version + 1);

        let tightened = stock.set_threshold(&record.id, 10).await.unwrap();
        assert!(tightened.is_low_stock);
    }

    #[tokio::test]
    async fn test_list_low_stock_filters() {
        let (_db, stock) = setup().await;

        let empty = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Ring")
            .await
            .unwrap();
        let mut healthy = stock
            .get_or_create(MetalType::Gold, "22K", "Gold Chain")
            .await
            .unwrap();
        let version = healthy.version;
        let delta = apply_in(&mut healthy, 20, 200_000).unwrap();
        stock
            .save_with_transaction(&healthy, version, &delta, None, None, "tester")
            .await
            .unwrap();

        let low = stock.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, empty.id);

        assert_eq!(stock.list().await.unwrap().len(), 2);
    }
}
