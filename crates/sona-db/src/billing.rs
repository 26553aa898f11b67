//! # Billing Workflow
//!
//! The service that turns a counter request into a persisted bill with its
//! stock movements applied. Everything stateful lives in the store; the
//! service itself is a stateless bundle of repositories and can be cloned
//! freely per request.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewBill request                                                        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  1. validate customer, price every item     ── any error: nothing      │
//! │     (rate lookup per metal + purity)           was persisted           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  2. aggregate totals + amount in words                                  │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  3. allocate bill number, insert bill +     ── duplicate number:       │
//! │     items in ONE transaction                   reallocate, ≤ 3 tries   │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  4. apply stock movements                   ── failure: bill is KEPT,  │
//! │      │                                         receipt says Failed,    │
//! │      ▼                                         resync_stock repairs    │
//! │  BillReceipt { bill, items, stock_sync }                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit/Delete Window
//! Updates and deletes revert the old stock movements before writing
//! anything new. Between a successful revert and a successful re-apply the
//! ledger and the bill disagree; a fault inside that window is surfaced as
//! [`BillingError::ReconciliationRequired`] with the affected SKUs rather
//! than papered over with a compensating write that could itself fail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::numbering::BillNumberAllocator;
use crate::pool::Database;
use crate::repository::bill::BillRepository;
use crate::repository::rate::RateRepository;
use crate::stock_sync::{StockSynchronizer, SyncError, SyncOutcome};
use sona_core::validation::{validate_customer_name, validate_customer_phone};
use sona_core::{
    aggregate, price_item, Bill, BillTotals, CoreError, GstBreakup, ItemInput, LineItem, Money,
    PaymentMode, PaymentStatus,
};

/// Bounded attempts for the allocate-and-insert race on bill numbers.
const MAX_NUMBER_ATTEMPTS: u32 = 3;

// =============================================================================
// Requests & Outcomes
// =============================================================================

/// A bill as submitted from the counter, before pricing.
///
/// Items arrive as raw [`ItemInput`]s; every derived figure (net weights,
/// metal values, totals, amount in words) is computed here and frozen onto
/// the persisted bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub customer_dob: Option<NaiveDate>,
    pub customer_pan: Option<String>,
    pub customer_aadhaar: Option<String>,

    /// Defaults to now; also selects the date segment of the bill number.
    pub bill_date: Option<DateTime<Utc>>,

    pub items: Vec<ItemInput>,
    /// Absolute GST amounts, entered at the counter.
    pub gst: GstBreakup,

    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
}

/// Whether the stock ledger reflects the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSyncStatus {
    /// All movements applied.
    Applied,
    /// The bill is saved but its movements did not (fully) land;
    /// [`BillingService::resync_stock`] repairs it.
    Failed { reason: String },
}

/// What a successful create or update hands back.
#[derive(Debug, Clone)]
pub struct BillReceipt {
    pub bill: Bill,
    pub items: Vec<LineItem>,
    pub stock_sync: StockSyncStatus,
}

// =============================================================================
// Errors
// =============================================================================

/// Failures of the billing workflow.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Pricing, aggregation or validation rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed outside any sensitive window.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Stock synchronization failed outside the edit/delete window
    /// (reverts on update/delete; `resync_stock` runs).
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A fault landed between a successful stock revert and a successful
    /// re-apply: the ledger and the bill disagree and an operator has to
    /// look. The listed SKUs bound the damage.
    #[error("Bill {bill_number} needs manual stock reconciliation (affected: {})", affected.join(", "))]
    ReconciliationRequired {
        bill_number: String,
        affected: Vec<String>,
    },
}

// =============================================================================
// Billing Service
// =============================================================================

/// Orchestrates pricing, numbering, persistence and stock sync.
#[derive(Debug, Clone)]
pub struct BillingService {
    bills: BillRepository,
    rates: RateRepository,
    allocator: BillNumberAllocator,
    sync: StockSynchronizer,
}

impl BillingService {
    /// Wires the service over one database with the given shop code as the
    /// bill number prefix.
    pub fn new(db: &Database, shop_code: impl Into<String>) -> Self {
        BillingService {
            bills: db.bills(),
            rates: db.rates(),
            allocator: BillNumberAllocator::new(db.pool().clone(), shop_code),
            sync: StockSynchronizer::new(db.stock()),
        }
    }

    /// Wires the service from pre-built parts (tests, custom pools).
    pub fn from_parts(
        bills: BillRepository,
        rates: RateRepository,
        allocator: BillNumberAllocator,
        sync: StockSynchronizer,
    ) -> Self {
        BillingService {
            bills,
            rates,
            allocator,
            sync,
        }
    }

    /// Creates a bill: price, aggregate, number, persist, sync stock.
    ///
    /// Pricing and aggregation run first; any failure there aborts before
    /// anything is persisted. A stock failure after the insert does not
    /// roll the bill back - the receipt carries
    /// [`StockSyncStatus::Failed`] and the bill stays queryable.
    pub async fn create_bill(
        &self,
        request: NewBill,
        actor: &str,
    ) -> Result<BillReceipt, BillingError> {
        validate_customer_name(&request.customer_name).map_err(CoreError::from)?;
        validate_customer_phone(&request.customer_phone).map_err(CoreError::from)?;

        let bill_date = request.bill_date.unwrap_or_else(Utc::now);
        let now = Utc::now();
        let bill_id = Uuid::new_v4().to_string();

        let items = self.price_items(&bill_id, &request.items, now).await?;
        let totals = aggregate(&items, &request.gst)?;

        // Allocate + insert; a lost number race reallocates and retries.
        // The unique index on bill numbers is the final arbiter.
        let mut attempt = 0;
        let bill = loop {
            attempt += 1;
            let allocated = self.allocator.next(bill_date.date_naive()).await;
            let bill = assemble_bill(
                &bill_id,
                &allocated.value,
                bill_date,
                &request,
                &totals,
                now,
                now,
            );
            match self.bills.insert(&bill, &items).await {
                Ok(()) => break bill,
                Err(e @ DbError::DuplicateBillNumber { .. }) if attempt < MAX_NUMBER_ATTEMPTS => {
                    warn!(
                        bill_number = %bill.bill_number,
                        attempt,
                        error = %e,
                        "Bill number race lost, reallocating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        };

        let stock_sync = match self.sync.apply_bill(&bill.bill_number, &items, actor).await {
            Ok(_) => StockSyncStatus::Applied,
            Err(e) => {
                error!(
                    bill_number = %bill.bill_number,
                    error = %e,
                    "Stock sync failed after bill persisted, resync required"
                );
                StockSyncStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            bill_number = %bill.bill_number,
            total = %bill.total(),
            items = items.len(),
            "Bill created"
        );

        Ok(BillReceipt {
            bill,
            items,
            stock_sync,
        })
    }

    /// Replaces a bill's contents, keeping its number.
    ///
    /// The request is priced up front (pure reads, nothing moves on a bad
    /// request); then strictly: revert old movements, replace bill + items
    /// in one transaction, apply new movements. Failures after the revert
    /// surface as [`BillingError::ReconciliationRequired`].
    pub async fn update_bill(
        &self,
        id: &str,
        request: NewBill,
        actor: &str,
    ) -> Result<BillReceipt, BillingError> {
        validate_customer_name(&request.customer_name).map_err(CoreError::from)?;
        validate_customer_phone(&request.customer_phone).map_err(CoreError::from)?;

        let existing = self
            .bills
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", id))?;
        let bill_number = existing.bill_number.clone();

        let now = Utc::now();
        let items = self.price_items(id, &request.items, now).await?;
        let totals = aggregate(&items, &request.gst)?;

        // Point of no return: old movements come off the ledger first
        self.sync.revert_bill(&bill_number, actor).await?;

        let bill = assemble_bill(
            id,
            &bill_number,
            request.bill_date.unwrap_or(existing.bill_date),
            &request,
            &totals,
            existing.created_at,
            now,
        );
        if let Err(e) = self.bills.update(&bill, &items).await {
            error!(
                bill_number = %bill_number,
                error = %e,
                "Bill replace failed after stock revert, manual reconciliation required"
            );
            return Err(BillingError::ReconciliationRequired {
                bill_number,
                affected: affected_skus(&items),
            });
        }

        if let Err(e) = self.sync.apply_bill(&bill_number, &items, actor).await {
            error!(
                bill_number = %bill_number,
                error = %e,
                "Stock apply failed after bill replace, manual reconciliation required"
            );
            return Err(BillingError::ReconciliationRequired {
                bill_number,
                affected: affected_skus(&items),
            });
        }

        info!(
            bill_number = %bill_number,
            total = %bill.total(),
            "Bill updated"
        );

        Ok(BillReceipt {
            bill,
            items,
            stock_sync: StockSyncStatus::Applied,
        })
    }

    /// Deletes a bill after putting its stock movements back.
    pub async fn delete_bill(&self, id: &str, actor: &str) -> Result<(), BillingError> {
        let existing = self
            .bills
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", id))?;
        let bill_number = existing.bill_number.clone();
        let items = self.bills.items_for(id).await?;

        self.sync.revert_bill(&bill_number, actor).await?;

        if let Err(e) = self.bills.delete(id).await {
            error!(
                bill_number = %bill_number,
                error = %e,
                "Bill delete failed after stock revert, manual reconciliation required"
            );
            return Err(BillingError::ReconciliationRequired {
                bill_number,
                affected: affected_skus(&items),
            });
        }

        info!(bill_number = %bill_number, "Bill deleted");
        Ok(())
    }

    /// Fetches a bill with its items in display order.
    pub async fn get_bill(&self, id: &str) -> Result<Option<(Bill, Vec<LineItem>)>, BillingError> {
        match self.bills.get_by_id(id).await? {
            Some(bill) => {
                let items = self.bills.items_for(id).await?;
                Ok(Some((bill, items)))
            }
            None => Ok(None),
        }
    }

    /// Re-runs the synchronizer for a bill whose receipt reported
    /// [`StockSyncStatus::Failed`] (or after manual reconciliation).
    pub async fn resync_stock(&self, id: &str, actor: &str) -> Result<SyncOutcome, BillingError> {
        let (bill, items) = self
            .get_bill(id)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", id))?;

        let outcome = self
            .sync
            .resync_bill(&bill.bill_number, &items, actor)
            .await?;

        info!(
            bill_number = %bill.bill_number,
            transitions = outcome.transitions,
            "Stock resynchronized"
        );
        Ok(outcome)
    }

    /// Prices every input against the current rate table.
    ///
    /// A missing (metal, purity) rate fails the whole batch with
    /// [`CoreError::RateNotFound`]; callers run this before any write.
    async fn price_items(
        &self,
        bill_id: &str,
        inputs: &[ItemInput],
        now: DateTime<Utc>,
    ) -> Result<Vec<LineItem>, BillingError> {
        let mut items = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.iter().enumerate() {
            let rate = self
                .rates
                .find(input.metal_type, &input.purity)
                .await?
                .ok_or_else(|| CoreError::RateNotFound {
                    metal_type: input.metal_type.to_string(),
                    purity: input.purity.clone(),
                })?;

            let priced = price_item(input, Money::from_paise(rate.rate_paise))?;

            items.push(LineItem {
                id: Uuid::new_v4().to_string(),
                bill_id: bill_id.to_string(),
                product_name: input.product_name.clone(),
                metal_type: input.metal_type,
                purity: input.purity.clone(),
                unit: input.unit,
                quantity: input.quantity,
                gross_weight_mg: input.gross_weight_mg,
                less_weight_mg: input.less_weight_mg,
                net_weight_mg: priced.net_weight_mg,
                rate_paise: rate.rate_paise,
                making_charge_kind: input.making_charge.kind(),
                making_charge_value: input.making_charge.value(),
                making_discount_paise: input.making_discount_paise,
                other_charges_paise: input.other_charges_paise,
                is_exchange: input.is_exchange,
                metal_value_paise: priced.metal_value_paise,
                making_charge_paise: priced.making_charge_paise,
                exchange_deduction_paise: priced.exchange_deduction_paise,
                total_paise: priced.total_paise,
                sort_order: index as i64,
                created_at: now,
            });
        }

        Ok(items)
    }
}

/// Builds the bill envelope from a request and computed totals.
fn assemble_bill(
    id: &str,
    bill_number: &str,
    bill_date: DateTime<Utc>,
    request: &NewBill,
    totals: &BillTotals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Bill {
    Bill {
        id: id.to_string(),
        bill_number: bill_number.to_string(),
        bill_date,
        customer_name: request.customer_name.trim().to_string(),
        customer_phone: request.customer_phone.trim().to_string(),
        customer_address: request.customer_address.clone(),
        customer_dob: request.customer_dob,
        customer_pan: request.customer_pan.clone(),
        customer_aadhaar: request.customer_aadhaar.clone(),
        subtotal_paise: totals.subtotal_paise,
        cgst_paise: request.gst.cgst_paise,
        sgst_paise: request.gst.sgst_paise,
        igst_paise: request.gst.igst_paise,
        total_gst_paise: totals.total_gst_paise,
        total_paise: totals.total_paise,
        amount_in_words: totals.amount_in_words.clone(),
        payment_mode: request.payment_mode,
        payment_status: request.payment_status,
        created_at,
        updated_at,
    }
}

/// Sorted, deduplicated SKU labels for reconciliation messages.
fn affected_skus(items: &[LineItem]) -> Vec<String> {
    let mut skus: Vec<String> = items.iter().map(LineItem::sku).collect();
    skus.sort();
    skus.dedup();
    skus
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use sona_core::ledger::apply_in;
    use sona_core::{MakingCharge, MetalType, Unit};

    fn chain_input(quantity: i64) -> ItemInput {
        ItemInput {
            product_name: "Gold Chain".to_string(),
            metal_type: MetalType::Gold,
            purity: "22K".to_string(),
            unit: Unit::Gram,
            quantity,
            gross_weight_mg: 10_000,
            less_weight_mg: 0,
            making_charge: MakingCharge::Percent { rate_bps: 1000 },
            making_discount_paise: 0,
            other_charges_paise: 0,
            is_exchange: false,
        }
    }

    fn request(items: Vec<ItemInput>, gst: GstBreakup) -> NewBill {
        NewBill {
            customer_name: "Asha Verma".to_string(),
            customer_phone: "+91 98765 43210".to_string(),
            customer_address: Some("12 MG Road, Pune".to_string()),
            customer_dob: None,
            customer_pan: None,
            customer_aadhaar: None,
            bill_date: Some(Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap()),
            items,
            gst,
            payment_mode: PaymentMode::Cash,
            payment_status: PaymentStatus::Paid,
        }
    }

    async fn setup() -> (Database, BillingService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Rate card: Gold 22K at Rs 6,000/g makes the arithmetic readable
        db.rates()
            .upsert(MetalType::Gold, "22K", 600_000, true)
            .await
            .unwrap();
        let service = BillingService::new(&db, "SJ");
        (db, service)
    }

    async fn seed_stock(db: &Database, product_name: &str, qty: i64, weight_mg: i64) -> String {
        let stock = db.stock();
        let mut record = stock
            .get_or_create(MetalType::Gold, "22K", product_name)
            .await
            .unwrap();
        let version = record.version;
        let delta = apply_in(&mut record, qty, weight_mg).unwrap();
        stock
            .save_with_transaction(&record, version, &delta, None, Some("opening stock"), "tester")
            .await
            .unwrap();
        record.id
    }

    #[tokio::test]
    async fn test_create_bill_full_flow() {
        let (db, service) = setup().await;
        let stock_id = seed_stock(&db, "Gold Chain", 10, 100_000).await;

        // Two 10g chains at 6,000/g with 10% making: 66,000 each
        let gst = GstBreakup {
            cgst_paise: 100_000,
            sgst_paise: 100_000,
            igst_paise: 0,
        };
        let receipt = service
            .create_bill(request(vec![chain_input(1), chain_input(1)], gst), "tester")
            .await
            .unwrap();

        assert_eq!(receipt.bill.bill_number, "SJ/150124/001");
        assert_eq!(receipt.bill.subtotal_paise, 13_200_000);
        assert_eq!(receipt.bill.total_paise, 13_400_000);
        assert_eq!(
            receipt.bill.amount_in_words,
            "One Lakh Thirty Four Thousand Rupees Only"
        );
        assert_eq!(receipt.stock_sync, StockSyncStatus::Applied);
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].total_paise, 6_600_000);

        // Both lines hit the same SKU: 2 pieces, 20g gone
        let record = db.stock().find_by_id(&stock_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 8);
        assert_eq!(record.weight_mg, 80_000);

        // Queryable through the service
        let (bill, items) = service.get_bill(&receipt.bill.id).await.unwrap().unwrap();
        assert_eq!(bill.bill_number, "SJ/150124/001");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].sort_order, 0);
        assert_eq!(items[1].sort_order, 1);
    }

    #[tokio::test]
    async fn test_missing_rate_aborts_before_anything_persists() {
        let (db, service) = setup().await;

        let mut silver = chain_input(1);
        silver.metal_type = MetalType::Silver;
        silver.purity = "99.9%".to_string();

        let err = service
            .create_bill(request(vec![chain_input(1), silver], GstBreakup::zero()), "tester")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::RateNotFound { .. })
        ));

        // No bill, no stock records, no ledger rows
        let summary = db
            .bills()
            .sales_summary(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(summary.bill_count, 0);
        assert!(db.stock().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_bill_rejected() {
        let (_db, service) = setup().await;

        let err = service
            .create_bill(request(Vec::new(), GstBreakup::zero()), "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Core(CoreError::EmptyBill)));
    }

    #[tokio::test]
    async fn test_blank_customer_name_rejected() {
        let (_db, service) = setup().await;

        let mut req = request(vec![chain_input(1)], GstBreakup::zero());
        req.customer_name = "   ".to_string();

        let err = service.create_bill(req, "tester").await.unwrap_err();
        assert!(matches!(err, BillingError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sequential_numbers_within_a_day() {
        let (_db, service) = setup().await;

        let first = service
            .create_bill(request(vec![chain_input(1)], GstBreakup::zero()), "tester")
            .await
            .unwrap();
        let second = service
            .create_bill(request(vec![chain_input(1)], GstBreakup::zero()), "tester")
            .await
            .unwrap();

        assert_eq!(first.bill.bill_number, "SJ/150124/001");
        assert_eq!(second.bill.bill_number, "SJ/150124/002");
    }

    #[tokio::test]
    async fn test_update_preserves_number_and_moves_stock() {
        let (db, service) = setup().await;
        let stock_id = seed_stock(&db, "Gold Chain", 10, 100_000).await;

        let receipt = service
            .create_bill(request(vec![chain_input(2)], GstBreakup::zero()), "tester")
            .await
            .unwrap();
        assert_eq!(
            db.stock()
                .find_by_id(&stock_id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            8
        );

        // Edited bill sells 3 chains instead of 2
        let updated = service
            .update_bill(
                &receipt.bill.id,
                request(vec![chain_input(3)], GstBreakup::zero()),
                "tester",
            )
            .await
            .unwrap();

        assert_eq!(updated.bill.bill_number, receipt.bill.bill_number);
        assert_eq!(updated.bill.id, receipt.bill.id);
        assert_eq!(updated.bill.created_at, receipt.bill.created_at);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].quantity, 3);

        let record = db.stock().find_by_id(&stock_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 7);
        assert_eq!(record.weight_mg, 70_000);
    }

    #[tokio::test]
    async fn test_update_with_missing_rate_leaves_everything_untouched() {
        let (db, service) = setup().await;
        let stock_id = seed_stock(&db, "Gold Chain", 10, 100_000).await;

        let receipt = service
            .create_bill(request(vec![chain_input(2)], GstBreakup::zero()), "tester")
            .await
            .unwrap();

        let mut platinum = chain_input(1);
        platinum.metal_type = MetalType::Platinum;
        platinum.purity = "95%".to_string();

        let err = service
            .update_bill(
                &receipt.bill.id,
                request(vec![platinum], GstBreakup::zero()),
                "tester",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::RateNotFound { .. })
        ));

        // Pricing failed before the revert: old movements still stand
        let record = db.stock().find_by_id(&stock_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 8);
        let (bill, items) = service.get_bill(&receipt.bill.id).await.unwrap().unwrap();
        assert_eq!(bill.total_paise, receipt.bill.total_paise);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_delete_reverts_stock_and_removes_bill() {
        let (db, service) = setup().await;
        let stock_id = seed_stock(&db, "Gold Chain", 10, 100_000).await;

        let receipt = service
            .create_bill(request(vec![chain_input(2)], GstBreakup::zero()), "tester")
            .await
            .unwrap();

        service.delete_bill(&receipt.bill.id, "tester").await.unwrap();

        let record = db.stock().find_by_id(&stock_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 10);
        assert_eq!(record.weight_mg, 100_000);
        assert!(service.get_bill(&receipt.bill.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_bill_is_not_found() {
        let (_db, service) = setup().await;

        let err = service.delete_bill("no-such-id", "tester").await.unwrap_err();
        assert!(matches!(err, BillingError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resync_is_idempotent_on_a_healthy_bill() {
        let (db, service) = setup().await;
        let stock_id = seed_stock(&db, "Gold Chain", 10, 100_000).await;

        let receipt = service
            .create_bill(request(vec![chain_input(2)], GstBreakup::zero()), "tester")
            .await
            .unwrap();

        // Revert + apply lands back on the same balances
        service.resync_stock(&receipt.bill.id, "tester").await.unwrap();

        let record = db.stock().find_by_id(&stock_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 8);
        assert_eq!(record.weight_mg, 80_000);
    }

    #[tokio::test]
    async fn test_exchange_item_credits_stock_and_reduces_total() {
        let (db, service) = setup().await;
        seed_stock(&db, "Gold Chain", 10, 100_000).await;

        let mut old_bangle = chain_input(1);
        old_bangle.product_name = "Old Bangle".to_string();
        old_bangle.is_exchange = true;
        old_bangle.making_charge = MakingCharge::Fixed { amount_paise: 0 };

        let receipt = service
            .create_bill(
                request(vec![chain_input(1), old_bangle], GstBreakup::zero()),
                "tester",
            )
            .await
            .unwrap();

        // Exchange line: 60,000 metal − 3% = 58,200; both lines add up
        assert_eq!(receipt.items[1].exchange_deduction_paise, 180_000);
        assert_eq!(receipt.items[1].total_paise, 5_820_000);
        assert_eq!(receipt.bill.subtotal_paise, 6_600_000 + 5_820_000);

        // The old article came INTO stock
        let record = db
            .stock()
            .find_by_key(MetalType::Gold, "22K", "Old Bangle")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity, 1);
        assert_eq!(record.weight_mg, 10_000);
    }

    #[test]
    fn test_reconciliation_message_names_bill_and_skus() {
        // The message is what an operator acts on; it must carry the bill
        // number and every SKU whose ledger rows need manual review.
        let err = BillingError::ReconciliationRequired {
            bill_number: "SJ/150124/001".to_string(),
            affected: vec![
                "Gold/22K/Gold Chain".to_string(),
                "Gold/22K/Old Bangle".to_string(),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("SJ/150124/001"));
        assert!(message.contains("Gold/22K/Gold Chain"));
        assert!(message.contains("Gold/22K/Old Bangle"));
    }
}
