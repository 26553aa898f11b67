//! # Stock Ledger Transitions
//!
//! The only way stock balances change. Pure state machine over a
//! [`StockRecord`]: each transition mutates the balances in memory, recomputes
//! the low-stock flag, and returns the [`LedgerDelta`] from which the caller
//! builds exactly one append-only [`crate::types::StockTransaction`].
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_in(qty, wt)          balances += (qty, wt)       no upper bound  │
//! │                                                                         │
//! │  apply_out(qty, wt)         balances −= (qty, wt)       CLAMPED AT 0    │
//! │                             applied delta ≠ request when stock short   │
//! │                                                                         │
//! │  apply_adjustment(tq, tw)   balances := (tq, tw)        physical count │
//! │                             delta = target − previous                  │
//! │                                                                         │
//! │  after every transition:    is_low_stock = quantity ≤ threshold        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Applied vs Requested
//! The clamp means an out-transition can apply less than was asked for
//! (selling from a ledger that was never seeded). The delta carries **both**
//! figures; the audit row records the applied delta as truth and keeps the
//! request visible beside it, so balances always equal the sum of applied
//! deltas and truncation is never silent.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::types::{StockRecord, StockTransactionKind};

// =============================================================================
// Ledger Delta
// =============================================================================

/// The outcome of one ledger transition.
///
/// `quantity_delta` / `weight_delta_mg` are signed and post-clamp: summing
/// them over a record's transactions reproduces its balances exactly.
/// `quantity_requested` / `weight_requested_mg` are the submitted magnitudes
/// (for adjustments: the absolute targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    pub kind: StockTransactionKind,
    pub quantity_delta: i64,
    pub weight_delta_mg: i64,
    pub quantity_requested: i64,
    pub weight_requested_mg: i64,
}

impl LedgerDelta {
    /// Whether the clamp truncated any part of the request.
    pub fn was_clamped(&self) -> bool {
        match self.kind {
            StockTransactionKind::Out => {
                -self.quantity_delta != self.quantity_requested
                    || -self.weight_delta_mg != self.weight_requested_mg
            }
            _ => false,
        }
    }
}

fn validate_magnitude(field: &str, value: i64) -> CoreResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

fn recompute_low_stock(record: &mut StockRecord) {
    record.is_low_stock = record.quantity <= record.low_stock_threshold;
}

// =============================================================================
// Transitions
// =============================================================================

/// Stock received: purchase, exchange taken in, or a sale being reverted.
/// Unbounded addition.
///
/// ## Example
/// ```rust
/// # use chrono::Utc;
/// # use sona_core::ledger::apply_in;
/// # use sona_core::types::{MetalType, StockRecord};
/// # let mut record = StockRecord {
/// #     id: "s".into(), metal_type: MetalType::Gold, purity: "22K".into(),
/// #     product_name: "Ring".into(), quantity: 2, weight_mg: 20_000,
/// #     cost_price_paise: None, selling_price_paise: None,
/// #     low_stock_threshold: 5, is_low_stock: true, version: 0,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let delta = apply_in(&mut record, 3, 30_000).unwrap();
/// assert_eq!(record.quantity, 5);
/// assert_eq!(record.weight_mg, 50_000);
/// assert_eq!(delta.quantity_delta, 3);
/// ```
pub fn apply_in(record: &mut StockRecord, qty: i64, weight_mg: i64) -> CoreResult<LedgerDelta> {
    validate_magnitude("quantity", qty)?;
    validate_magnitude("weight", weight_mg)?;

    record.quantity += qty;
    record.weight_mg += weight_mg;
    recompute_low_stock(record);

    Ok(LedgerDelta {
        kind: StockTransactionKind::In,
        quantity_delta: qty,
        weight_delta_mg: weight_mg,
        quantity_requested: qty,
        weight_requested_mg: weight_mg,
    })
}

/// Stock issued: a sale, or an exchange intake being reverted.
///
/// Balances clamp at zero - stock is never negative. When the request
/// exceeds what is on hand, the applied delta is the truncated change and
/// [`LedgerDelta::was_clamped`] reports the difference.
pub fn apply_out(record: &mut StockRecord, qty: i64, weight_mg: i64) -> CoreResult<LedgerDelta> {
    validate_magnitude("quantity", qty)?;
    validate_magnitude("weight", weight_mg)?;

    let applied_qty = qty.min(record.quantity);
    let applied_weight = weight_mg.min(record.weight_mg);

    record.quantity -= applied_qty;
    record.weight_mg -= applied_weight;
    recompute_low_stock(record);

    Ok(LedgerDelta {
        kind: StockTransactionKind::Out,
        quantity_delta: -applied_qty,
        weight_delta_mg: -applied_weight,
        quantity_requested: qty,
        weight_requested_mg: weight_mg,
    })
}

/// Physical-count correction: sets the balances to the counted absolute
/// values. The recorded delta is the difference from the pre-adjustment
/// balances, so the audit trail still sums to the running balance.
pub fn apply_adjustment(
    record: &mut StockRecord,
    target_qty: i64,
    target_weight_mg: i64,
) -> CoreResult<LedgerDelta> {
    validate_magnitude("quantity", target_qty)?;
    validate_magnitude("weight", target_weight_mg)?;

    let quantity_delta = target_qty - record.quantity;
    let weight_delta_mg = target_weight_mg - record.weight_mg;

    record.quantity = target_qty;
    record.weight_mg = target_weight_mg;
    recompute_low_stock(record);

    Ok(LedgerDelta {
        kind: StockTransactionKind::Adjustment,
        quantity_delta,
        weight_delta_mg,
        quantity_requested: target_qty,
        weight_requested_mg: target_weight_mg,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
