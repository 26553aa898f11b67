//! # Bill Repository
//!
//! Database operations for bills and their line items.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert(bill, items) → bill row + item rows, one transaction    │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── update(bill, items) → bill row updated, items replaced         │
//! │         (line items are snapshots; edits replace, never mutate)        │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── set_payment_status() → paid / pending / partial                │
//! │                                                                         │
//! │  4. (RARE) DELETE                                                      │
//! │     └── delete() → item rows cascade via foreign key                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bill Number Collisions
//! `bills.bill_number` carries a UNIQUE index. A concurrent writer racing to
//! the same number makes `insert` fail with [`DbError::DuplicateBillNumber`],
//! which the billing service treats as "allocate again and retry".

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use sona_core::{Bill, LineItem, PaymentStatus};

/// Aggregate figures for a date range, used by day-book style reports.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub bill_count: i64,
    pub subtotal_paise: i64,
    pub total_gst_paise: i64,
    pub total_paise: i64,
}

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Inserts a bill and all its line items in one transaction.
    ///
    /// ## Arguments
    /// * `bill` - Complete bill with totals already aggregated
    /// * `items` - Priced line items (bill_id must match `bill.id`)
    ///
    /// ## Returns
    /// * `Ok(())` - Bill and items persisted atomically
    /// * `Err(DbError::DuplicateBillNumber)` - Number race lost, retryable
    pub async fn insert(&self, bill: &Bill, items: &[LineItem]) -> DbResult<()> {
        debug!(id = %bill.id, bill_number = %bill.bill_number, items = items.len(), "Inserting bill");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills (
                id, bill_number, bill_date,
                customer_name, customer_phone, customer_address,
                customer_dob, customer_pan, customer_aadhaar,
                subtotal_paise, cgst_paise, sgst_paise, igst_paise,
                total_gst_paise, total_paise, amount_in_words,
                payment_mode, payment_status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16,
                ?17, ?18,
                ?19, ?20
            )
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.bill_number)
        .bind(bill.bill_date)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(&bill.customer_address)
        .bind(bill.customer_dob)
        .bind(&bill.customer_pan)
        .bind(&bill.customer_aadhaar)
        .bind(bill.subtotal_paise)
        .bind(bill.cgst_paise)
        .bind(bill.sgst_paise)
        .bind(bill.igst_paise)
        .bind(bill.total_gst_paise)
        .bind(bill.total_paise)
        .bind(&bill.amount_in_words)
        .bind(bill.payment_mode)
        .bind(bill.payment_status)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| with_bill_number(e.into(), &bill.bill_number))?;

        for item in items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Updates a bill and replaces its entire item set in one transaction.
    ///
    /// ## Snapshot Pattern
    /// Line items are frozen pricing snapshots. An edit never mutates
    /// existing item rows: the old set is deleted and the re-priced set is
    /// inserted, so the persisted items always match the persisted totals.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Bill doesn't exist
    pub async fn update(&self, bill: &Bill, items: &[LineItem]) -> DbResult<()> {
        debug!(id = %bill.id, bill_number = %bill.bill_number, items = items.len(), "Updating bill");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bills SET
                bill_date = ?2,
                customer_name = ?3,
                customer_phone = ?4,
                customer_address = ?5,
                customer_dob = ?6,
                customer_pan = ?7,
                customer_aadhaar = ?8,
                subtotal_paise = ?9,
                cgst_paise = ?10,
                sgst_paise = ?11,
                igst_paise = ?12,
                total_gst_paise = ?13,
                total_paise = ?14,
                amount_in_words = ?15,
                payment_mode = ?16,
                payment_status = ?17,
                updated_at = ?18
            WHERE id = ?1
            "#,
        )
        .bind(&bill.id)
        .bind(bill.bill_date)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(&bill.customer_address)
        .bind(bill.customer_dob)
        .bind(&bill.customer_pan)
        .bind(&bill.customer_aadhaar)
        .bind(bill.subtotal_paise)
        .bind(bill.cgst_paise)
        .bind(bill.sgst_paise)
        .bind(bill.igst_paise)
        .bind(bill.total_gst_paise)
        .bind(bill.total_paise)
        .bind(&bill.amount_in_words)
        .bind(bill.payment_mode)
        .bind(bill.payment_status)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill", &bill.id));
        }

        sqlx::query("DELETE FROM bill_items WHERE bill_id = ?1")
            .bind(&bill.id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a bill. Line items cascade via the foreign key.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting bill");

        let result = sqlx::query("DELETE FROM bills WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill", id));
        }

        Ok(())
    }

    /// Gets a bill by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            SELECT
                id, bill_number, bill_date,
                customer_name, customer_phone, customer_address,
                customer_dob, customer_pan, customer_aadhaar,
                subtotal_paise, cgst_paise, sgst_paise, igst_paise,
                total_gst_paise, total_paise, amount_in_words,
                payment_mode, payment_status,
                created_at, updated_at
            FROM bills
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Gets a bill by its business number (e.g. "SJ/150124/001").
    pub async fn get_by_number(&self, bill_number: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            SELECT
                id, bill_number, bill_date,
                customer_name, customer_phone, customer_address,
                customer_dob, customer_pan, customer_aadhaar,
                subtotal_paise, cgst_paise, sgst_paise, igst_paise,
                total_gst_paise, total_paise, amount_in_words,
                payment_mode, payment_status,
                created_at, updated_at
            FROM bills
            WHERE bill_number = ?1
            "#,
        )
        .bind(bill_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Gets all line items for a bill, in printed order.
    pub async fn items_for(&self, bill_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT
                id, bill_id,
                product_name, metal_type, purity, unit, quantity,
                gross_weight_mg, less_weight_mg, net_weight_mg,
                rate_paise, making_charge_kind, making_charge_value,
                making_discount_paise, other_charges_paise, is_exchange,
                metal_value_paise, making_charge_paise,
                exchange_deduction_paise, total_paise,
                sort_order, created_at
            FROM bill_items
            WHERE bill_id = ?1
            ORDER BY sort_order
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Finds the highest sequential bill number matching a prefix pattern.
    ///
    /// ## How The Allocator Uses This
    /// Pattern is `PREFIX/DDMMYY/%`. Within one day all sequential numbers
    /// share the same zero-padded width, so string-descending order equals
    /// numeric order and the first row is the latest sequence. Fallback
    /// numbers (`F`-suffixed) sort above every digit and never carry a
    /// sequence; they are excluded here so a day that saw a store fault
    /// still seeds its counter from the real sequential maximum.
    ///
    /// ## Returns
    /// * `Ok(Some(bill_number))` - Latest matching sequential number
    /// * `Ok(None)` - No sequential bills for the pattern yet
    pub async fn latest_number_like(&self, pattern: &str) -> DbResult<Option<String>> {
        let fallback_pattern = format!("{}F%", pattern.trim_end_matches('%'));

        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT bill_number
            FROM bills
            WHERE bill_number LIKE ?1 AND bill_number NOT LIKE ?2
            ORDER BY bill_number DESC
            LIMIT 1
            "#,
        )
        .bind(pattern)
        .bind(&fallback_pattern)
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    /// Lists bills whose date falls within `[from, to]`, newest first.
    pub async fn list_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT
                id, bill_number, bill_date,
                customer_name, customer_phone, customer_address,
                customer_dob, customer_pan, customer_aadhaar,
                subtotal_paise, cgst_paise, sgst_paise, igst_paise,
                total_gst_paise, total_paise, amount_in_words,
                payment_mode, payment_status,
                created_at, updated_at
            FROM bills
            WHERE bill_date >= ?1 AND bill_date <= ?2
            ORDER BY bill_date DESC, bill_number DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Aggregates bill counts and totals for a date range.
    ///
    /// ## Usage
    /// Day book and GST filing summaries. Empty ranges return zeros,
    /// not an error.
    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COUNT(*) AS bill_count,
                COALESCE(SUM(subtotal_paise), 0) AS subtotal_paise,
                COALESCE(SUM(total_gst_paise), 0) AS total_gst_paise,
                COALESCE(SUM(total_paise), 0) AS total_paise
            FROM bills
            WHERE bill_date >= ?1 AND bill_date <= ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Updates the settlement state of a bill.
    pub async fn set_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bills SET
                payment_status = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill", id));
        }

        Ok(())
    }
}

/// Inserts one line item inside an open transaction.
async fn insert_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    item: &LineItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bill_items (
            id, bill_id,
            product_name, metal_type, purity, unit, quantity,
            gross_weight_mg, less_weight_mg, net_weight_mg,
            rate_paise, making_charge_kind, making_charge_value,
            making_discount_paise, other_charges_paise, is_exchange,
            metal_value_paise, making_charge_paise,
            exchange_deduction_paise, total_paise,
            sort_order, created_at
        ) VALUES (
            ?1, ?2,
            ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18,
            ?19, ?20,
            ?21, ?22
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.bill_id)
    .bind(&item.product_name)
    .bind(item.metal_type)
    .bind(&item.purity)
    .bind(item.unit)
    .bind(item.quantity)
    .bind(item.gross_weight_mg)
    .bind(item.less_weight_mg)
    .bind(item.net_weight_mg)
    .bind(item.rate_paise)
    .bind(item.making_charge_kind)
    .bind(item.making_charge_value)
    .bind(item.making_discount_paise)
    .bind(item.other_charges_paise)
    .bind(item.is_exchange)
    .bind(item.metal_value_paise)
    .bind(item.making_charge_paise)
    .bind(item.exchange_deduction_paise)
    .bind(item.total_paise)
    .bind(item.sort_order)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Fills the concrete bill number into a DuplicateBillNumber error.
/// The sqlx conversion layer only sees the constraint name, not the value.
fn with_bill_number(err: DbError, number: &str) -> DbError {
    match err {
        DbError::DuplicateBillNumber { .. } => DbError::DuplicateBillNumber {
            bill_number: number.to_string(),
        },
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use sona_core::{MakingChargeKind, MetalType, PaymentMode, Unit};

    async fn setup() -> (Database, BillRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bills = db.bills();
        (db, bills)
    }

    fn day(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, hour, 0, 0).unwrap()
    }

    fn bill_at(number: &str, bill_date: DateTime<Utc>) -> Bill {
        let now = Utc::now();
        Bill {
            id: uuid::Uuid::new_v4().to_string(),
            bill_number: number.to_string(),
            bill_date,
            customer_name: "Asha Verma".to_string(),
            customer_phone: "9876543210".to_string(),
            customer_address: None,
            customer_dob: None,
            customer_pan: None,
            customer_aadhaar: None,
            subtotal_paise: 1_000_000,
            cgst_paise: 15_000,
            sgst_paise: 15_000,
            igst_paise: 0,
            total_gst_paise: 30_000,
            total_paise: 1_030_000,
            amount_in_words: "Ten Thousand Three Hundred Rupees Only".to_string(),
            payment_mode: PaymentMode::Cash,
            payment_status: PaymentStatus::Paid,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_bill(number: &str) -> Bill {
        bill_at(number, day(15, 11))
    }

    fn sample_item(bill_id: &str, product_name: &str, sort_order: i64) -> LineItem {
        LineItem {
            id: uuid::Uuid::new_v4().to_string(),
            bill_id: bill_id.to_string(),
            product_name: product_name.to_string(),
            metal_type: MetalType::Gold,
            purity: "22K".to_string(),
            unit: Unit::Gram,
            quantity: 1,
            gross_weight_mg: 10_000,
            less_weight_mg: 0,
            net_weight_mg: 10_000,
            rate_paise: 600_000,
            making_charge_kind: MakingChargeKind::Fixed,
            making_charge_value: 50_000,
            making_discount_paise: 0,
            other_charges_paise: 0,
            is_exchange: false,
            metal_value_paise: 6_000_000,
            making_charge_paise: 50_000,
            exchange_deduction_paise: 0,
            total_paise: 6_050_000,
            sort_order,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_bill_and_items() {
        let (_db, bills) = setup().await;
        let bill = sample_bill("SJ/150124/001");
        // Inserted out of order; reads must come back in printed order
        let items = vec![
            sample_item(&bill.id, "Gold Chain", 1),
            sample_item(&bill.id, "Gold Ring", 0),
        ];

        bills.insert(&bill, &items).await.unwrap();

        let found = bills.get_by_number("SJ/150124/001").await.unwrap().unwrap();
        assert_eq!(found.id, bill.id);
        assert_eq!(found.customer_name, "Asha Verma");
        assert_eq!(found.total_paise, 1_030_000);

        let stored = bills.items_for(&bill.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].product_name, "Gold Ring");
        assert_eq!(stored[1].product_name, "Gold Chain");

        assert!(bills.get_by_number("SJ/150124/002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected_with_the_number() {
        let (_db, bills) = setup().await;
        bills
            .insert(&sample_bill("SJ/150124/001"), &[])
            .await
            .unwrap();

        let err = bills
            .insert(&sample_bill("SJ/150124/001"), &[])
            .await
            .unwrap_err();
        match err {
            DbError::DuplicateBillNumber { bill_number } => {
                assert_eq!(bill_number, "SJ/150124/001");
            }
            other => panic!("expected DuplicateBillNumber, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_the_item_set() {
        let (_db, bills) = setup().await;
        let mut bill = sample_bill("SJ/150124/001");
        let items = vec![
            sample_item(&bill.id, "Gold Ring", 0),
            sample_item(&bill.id, "Gold Chain", 1),
        ];
        bills.insert(&bill, &items).await.unwrap();

        bill.customer_name = "Asha V. Sharma".to_string();
        bill.total_paise = 6_050_000;
        let replacement = vec![sample_item(&bill.id, "Gold Bangle", 0)];
        bills.update(&bill, &replacement).await.unwrap();

        let found = bills.get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(found.customer_name, "Asha V. Sharma");
        assert_eq!(found.total_paise, 6_050_000);

        let stored = bills.items_for(&bill.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].product_name, "Gold Bangle");
    }

    #[tokio::test]
    async fn test_update_of_missing_bill_is_not_found() {
        let (_db, bills) = setup().await;
        let ghost = sample_bill("SJ/150124/001");
        let err = bills.update(&ghost, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_bill_and_items() {
        let (_db, bills) = setup().await;
        let bill = sample_bill("SJ/150124/001");
        let items = vec![sample_item(&bill.id, "Gold Ring", 0)];
        bills.insert(&bill, &items).await.unwrap();

        bills.delete(&bill.id).await.unwrap();

        assert!(bills.get_by_id(&bill.id).await.unwrap().is_none());
        assert!(bills.items_for(&bill.id).await.unwrap().is_empty());

        let err = bills.delete(&bill.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_latest_number_scan_skips_fallbacks() {
        let (_db, bills) = setup().await;
        bills
            .insert(&sample_bill("SJ/150124/004"), &[])
            .await
            .unwrap();
        // 'F' sorts above every digit; the scan must not pick this up
        bills
            .insert(&sample_bill("SJ/150124/F99999"), &[])
            .await
            .unwrap();

        let latest = bills.latest_number_like("SJ/150124/%").await.unwrap();
        assert_eq!(latest.as_deref(), Some("SJ/150124/004"));

        bills
            .insert(&bill_at("SJ/160124/F00001", day(16, 10)), &[])
            .await
            .unwrap();
        assert!(bills
            .latest_number_like("SJ/160124/%")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sales_summary_sums_the_range() {
        let (_db, bills) = setup().await;
        bills
            .insert(&bill_at("SJ/150124/001", day(15, 10)), &[])
            .await
            .unwrap();
        bills
            .insert(&bill_at("SJ/150124/002", day(15, 18)), &[])
            .await
            .unwrap();
        bills
            .insert(&bill_at("SJ/160124/001", day(16, 10)), &[])
            .await
            .unwrap();

        let summary = bills.sales_summary(day(15, 0), day(15, 23)).await.unwrap();
        assert_eq!(summary.bill_count, 2);
        assert_eq!(summary.subtotal_paise, 2_000_000);
        assert_eq!(summary.total_gst_paise, 60_000);
        assert_eq!(summary.total_paise, 2_060_000);

        let empty = bills.sales_summary(day(1, 0), day(1, 23)).await.unwrap();
        assert_eq!(empty.bill_count, 0);
        assert_eq!(empty.total_paise, 0);
    }

    #[tokio::test]
    async fn test_list_by_date_range_is_inclusive_newest_first() {
        let (_db, bills) = setup().await;
        bills
            .insert(&bill_at("SJ/140124/001", day(14, 12)), &[])
            .await
            .unwrap();
        bills
            .insert(&bill_at("SJ/150124/001", day(15, 12)), &[])
            .await
            .unwrap();
        bills
            .insert(&bill_at("SJ/160124/001", day(16, 12)), &[])
            .await
            .unwrap();

        // Both endpoints land exactly on bill timestamps
        let listed = bills.list_by_date_range(day(14, 12), day(15, 12)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].bill_number, "SJ/150124/001");
        assert_eq!(listed[1].bill_number, "SJ/140124/001");
    }

    #[tokio::test]
    async fn test_set_payment_status() {
        let (_db, bills) = setup().await;
        let mut bill = sample_bill("SJ/150124/001");
        bill.payment_status = PaymentStatus::Pending;
        bills.insert(&bill, &[]).await.unwrap();

        bills
            .set_payment_status(&bill.id, PaymentStatus::Paid)
            .await
            .unwrap();
        let found = bills.get_by_id(&bill.id).await.unwrap().unwrap();
        assert_eq!(found.payment_status, PaymentStatus::Paid);

        let err = bills
            .set_payment_status("no-such-id", PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
