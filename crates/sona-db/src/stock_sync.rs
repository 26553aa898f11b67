//! # Bill-to-Stock Synchronization
//!
//! Translates a bill's line items into stock ledger movements, and undoes
//! them again when a bill is edited or deleted.
//!
//! ## Movement Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Bill Items → Ledger Movements                           │
//! │                                                                         │
//! │  Sale item          stock OUT   (qty = item quantity,                  │
//! │                                  weight = net weight)                  │
//! │  Exchange item      stock IN    (old article taken from customer)      │
//! │                                                                         │
//! │  revert_bill        the exact inverse of the OUTSTANDING net applied   │
//! │                     deltas recorded under the bill number:             │
//! │                       sale-out      reverts as IN                      │
//! │                       exchange-in   reverts as OUT                     │
//! │                                                                         │
//! │  resync_bill        revert + apply (recovery for a half-synced bill)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Net Deltas, Not Items
//! Reverting from the bill's current items would drift the moment an apply
//! was clamped (requested 5, applied 3 ⇒ revert must put back 3, not 5) or
//! a bill was edited twice. The ledger already knows exactly what this bill
//! did to each record; the inverse of that is always the right undo, and a
//! second revert finds net zero and does nothing.
//!
//! ## Atomicity Boundary
//! Each stock record is synchronized atomically (balance write + audit row
//! in one transaction, guarded by the version column). The bill as a whole
//! is not: a fault mid-way leaves earlier records moved. The billing layer
//! owns that gap and surfaces it for reconciliation; `resync_bill` is the
//! repair tool.

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::stock::StockRepository;
use sona_core::error::{CoreError, CoreResult};
use sona_core::ledger::{apply_in, apply_out, LedgerDelta};
use sona_core::{LineItem, StockRecord};

/// Bounded attempts for one record's optimistic-lock write.
const MAX_WRITE_ATTEMPTS: u32 = 3;

// =============================================================================
// Outcome & Errors
// =============================================================================

/// What one synchronization pass did.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Ledger rows written.
    pub transitions: usize,
    /// SKU labels where the never-negative clamp truncated an out-movement.
    pub clamped_skus: Vec<String>,
}

impl SyncOutcome {
    fn merge(mut self, other: SyncOutcome) -> SyncOutcome {
        self.transitions += other.transitions;
        self.clamped_skus.extend(other.clamped_skus);
        self
    }
}

/// Synchronization failures, with enough context to find the damage.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A stock write failed (store fault, or optimistic-lock attempts
    /// exhausted). Records synchronized before this one stay moved.
    #[error("Stock write failed for bill {bill_number}, SKU {sku}: {source}")]
    StockWrite {
        bill_number: String,
        sku: String,
        #[source]
        source: DbError,
    },

    /// The ledger state machine rejected a transition (negative magnitudes
    /// and the like; not expected from priced items).
    #[error("Ledger transition rejected for bill {bill_number}, SKU {sku}: {source}")]
    Transition {
        bill_number: String,
        sku: String,
        #[source]
        source: CoreError,
    },
}

impl SyncError {
    fn stock_write(bill_number: &str, sku: &str, source: DbError) -> Self {
        SyncError::StockWrite {
            bill_number: bill_number.to_string(),
            sku: sku.to_string(),
            source,
        }
    }

    fn transition(bill_number: &str, sku: &str, source: CoreError) -> Self {
        SyncError::Transition {
            bill_number: bill_number.to_string(),
            sku: sku.to_string(),
            source,
        }
    }
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Applies and reverts bill stock movements.
#[derive(Debug, Clone)]
pub struct StockSynchronizer {
    stock: StockRepository,
}

impl StockSynchronizer {
    /// Creates a new synchronizer over the stock repository.
    pub fn new(stock: StockRepository) -> Self {
        StockSynchronizer { stock }
    }

    /// Applies a bill's items to the stock ledger.
    ///
    /// Per item: `get_or_create` the record for the SKU triple, then one
    /// transition - IN for exchange items, OUT for sales. Every movement row
    /// is tagged with the bill number so it can be found and undone later.
    ///
    /// Clamped out-movements (selling a SKU the ledger never saw stocked)
    /// still write their audit row: the requested figures stay visible even
    /// though nothing moved.
    pub async fn apply_bill(
        &self,
        bill_number: &str,
        items: &[LineItem],
        actor: &str,
    ) -> Result<SyncOutcome, SyncError> {
        debug!(bill_number = %bill_number, items = items.len(), "Applying bill to stock");

        let mut outcome = SyncOutcome::default();

        for item in items {
            let qty = item.quantity;
            let weight = item.net_weight_mg;
            if qty == 0 && weight == 0 {
                continue;
            }

            let sku = item.sku();
            let record = self
                .stock
                .get_or_create(item.metal_type, &item.purity, &item.product_name)
                .await
                .map_err(|e| SyncError::stock_write(bill_number, &sku, e))?;

            let is_exchange = item.is_exchange;
            let written = self
                .write_with_retry(bill_number, &sku, record, actor, true, |rec| {
                    if is_exchange {
                        apply_in(rec, qty, weight)
                    } else {
                        apply_out(rec, qty, weight)
                    }
                })
                .await?;

            if let Some(delta) = written {
                outcome.transitions += 1;
                if delta.was_clamped() {
                    warn!(
                        bill_number = %bill_number,
                        sku = %sku,
                        requested_qty = delta.quantity_requested,
                        applied_qty = -delta.quantity_delta,
                        "Out-movement clamped by empty stock"
                    );
                    outcome.clamped_skus.push(sku);
                }
            }
        }

        Ok(outcome)
    }

    /// Undoes whatever this bill currently has applied to the ledger.
    ///
    /// Reads the net applied deltas per record under the bill number and
    /// applies one inverse movement per record (split into an IN and an OUT
    /// component when an edit history left mixed signs). Records with net
    /// zero are skipped, so repeated reverts are no-ops.
    pub async fn revert_bill(
        &self,
        bill_number: &str,
        actor: &str,
    ) -> Result<SyncOutcome, SyncError> {
        debug!(bill_number = %bill_number, "Reverting bill from stock");

        let nets = self
            .stock
            .net_deltas_for_bill(bill_number)
            .await
            .map_err(|e| SyncError::stock_write(bill_number, "*", e))?;

        let mut outcome = SyncOutcome::default();

        for net in nets {
            if net.is_zero() {
                continue;
            }

            let record = self
                .load_record(bill_number, &net.stock_record_id)
                .await?;
            let sku = record.sku();

            // Inverse, split per axis. A record that netted OUT comes back
            // IN; a record that netted IN (exchange) goes back OUT.
            let in_qty = (-net.quantity_delta).max(0);
            let in_weight = (-net.weight_delta_mg).max(0);
            let out_qty = net.quantity_delta.max(0);
            let out_weight = net.weight_delta_mg.max(0);

            let mut current = record;

            if in_qty > 0 || in_weight > 0 {
                let written = self
                    .write_with_retry(bill_number, &sku, current.clone(), actor, false, |rec| {
                        apply_in(rec, in_qty, in_weight)
                    })
                    .await?;
                if written.is_some() {
                    outcome.transitions += 1;
                }
                if out_qty > 0 || out_weight > 0 {
                    current = self.load_record(bill_number, &net.stock_record_id).await?;
                }
            }

            if out_qty > 0 || out_weight > 0 {
                let written = self
                    .write_with_retry(bill_number, &sku, current, actor, false, |rec| {
                        apply_out(rec, out_qty, out_weight)
                    })
                    .await?;
                if let Some(delta) = written {
                    outcome.transitions += 1;
                    if delta.was_clamped() {
                        warn!(
                            bill_number = %bill_number,
                            sku = %sku,
                            "Revert clamped: exchanged stock was already issued"
                        );
                        outcome.clamped_skus.push(sku.clone());
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Revert + apply: brings a partially synchronized bill back in line
    /// with its current item set.
    pub async fn resync_bill(
        &self,
        bill_number: &str,
        items: &[LineItem],
        actor: &str,
    ) -> Result<SyncOutcome, SyncError> {
        debug!(bill_number = %bill_number, "Resyncing bill stock");

        let reverted = self.revert_bill(bill_number, actor).await?;
        let applied = self.apply_bill(bill_number, items, actor).await?;
        Ok(reverted.merge(applied))
    }

    async fn load_record(&self, bill_number: &str, id: &str) -> Result<StockRecord, SyncError> {
        self.stock
            .find_by_id(id)
            .await
            .map_err(|e| SyncError::stock_write(bill_number, id, e))?
            // Ledger rows forbid record deletion, so a miss means a torn store
            .ok_or_else(|| {
                SyncError::stock_write(bill_number, id, DbError::not_found("StockRecord", id))
            })
    }

    /// Runs one transition against one record under optimistic locking.
    ///
    /// On a version conflict the record is reloaded and the transition
    /// recomputed from the fresh balances, up to [`MAX_WRITE_ATTEMPTS`].
    ///
    /// `record_noops` controls whether a transition whose applied delta is
    /// fully zero still writes its audit row: apply keeps them (a clamped
    /// sale must stay visible), revert skips them (nothing outstanding
    /// means nothing to record).
    async fn write_with_retry<F>(
        &self,
        bill_number: &str,
        sku: &str,
        record: StockRecord,
        actor: &str,
        record_noops: bool,
        transition: F,
    ) -> Result<Option<LedgerDelta>, SyncError>
    where
        F: Fn(&mut StockRecord) -> CoreResult<LedgerDelta>,
    {
        let mut current = record;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut staged = current.clone();
            let delta = transition(&mut staged)
                .map_err(|e| SyncError::transition(bill_number, sku, e))?;

            if !record_noops && delta.quantity_delta == 0 && delta.weight_delta_mg == 0 {
                return Ok(None);
            }

            match self
                .stock
                .save_with_transaction(
                    &staged,
                    current.version,
                    &delta,
                    Some(bill_number),
                    None,
                    actor,
                )
                .await
            {
                Ok(_) => return Ok(Some(delta)),
                Err(DbError::Conflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                    debug!(
                        sku = %sku,
                        attempt,
                        "Stock version conflict, reloading and retrying"
                    );
                    current = self.load_record(bill_number, &staged.id).await?;
                }
                Err(e) => return Err(SyncError::stock_write(bill_number, sku, e)),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
