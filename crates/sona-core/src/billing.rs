//! # Bill Aggregator
//!
//! Folds a set of priced line items and a GST breakup into the bill's
//! financial block.
//!
//! ## GST Is Entered, Never Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  This module NEVER computes GST from a percentage.                      │
//! │                                                                         │
//! │  CGST / SGST / IGST arrive as absolute amounts entered at the counter. │
//! │  Which of them apply (intra-state vs inter-state, composition scheme,  │
//! │  old-gold exchanges) is a tax decision the operator already made;      │
//! │  deriving it here would bake in wrong assumptions.                     │
//! │                                                                         │
//! │  subtotal  = Σ item.total                                              │
//! │  total_gst = cgst + sgst + igst                                        │
//! │  total     = subtotal + total_gst                                      │
//! │  words     = amount_in_words(total)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineItem;
use crate::validation::validate_non_negative_paise;
use crate::words::amount_in_words;
use crate::MAX_BILL_ITEMS;

// =============================================================================
// GST Breakup
// =============================================================================

/// Caller-supplied absolute GST amounts for one bill.
///
/// All three default to zero; `total()` is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstBreakup {
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub igst_paise: i64,
}

impl GstBreakup {
    /// A breakup with no tax (exchange-only bills, composition scheme).
    #[inline]
    pub const fn zero() -> Self {
        GstBreakup {
            cgst_paise: 0,
            sgst_paise: 0,
            igst_paise: 0,
        }
    }

    /// Total GST as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.cgst_paise + self.sgst_paise + self.igst_paise)
    }
}

// =============================================================================
// Bill Totals
// =============================================================================

/// The recomputed financial block of a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal_paise: i64,
    pub total_gst_paise: i64,
    pub total_paise: i64,
    pub amount_in_words: String,
}

impl BillTotals {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_paise(self.subtotal_paise)
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

// =============================================================================
// aggregate
// =============================================================================

/// Aggregates priced items and the GST breakup into bill totals.
///
/// ## Errors
/// - [`CoreError::EmptyBill`] when `items` is empty
/// - [`CoreError::TooManyItems`] beyond [`MAX_BILL_ITEMS`]
/// - `Validation` when any GST component is negative
///
/// ## Round-Trip Law
/// Re-running this function over a persisted bill's items and GST fields
/// must reproduce the stored `subtotal`/`total` exactly; the billing
/// service relies on that to keep stored totals honest across edits.
///
/// ## Example
/// ```rust
/// use sona_core::billing::{aggregate, GstBreakup};
/// # use chrono::Utc;
/// # use sona_core::types::{LineItem, MakingChargeKind, MetalType, Unit};
/// # fn item(total_paise: i64) -> LineItem {
/// #     LineItem {
/// #         id: "i".into(), bill_id: "b".into(),
/// #         product_name: "Gold Chain".into(), metal_type: MetalType::Gold,
/// #         purity: "22K".into(), unit: Unit::Gram, quantity: 1,
/// #         gross_weight_mg: 10_000, less_weight_mg: 0, net_weight_mg: 10_000,
/// #         rate_paise: 600_000, making_charge_kind: MakingChargeKind::Percent,
/// #         making_charge_value: 1000, making_discount_paise: 0,
/// #         other_charges_paise: 0, is_exchange: false,
/// #         metal_value_paise: 6_000_000, making_charge_paise: 600_000,
/// #         exchange_deduction_paise: 0, total_paise, sort_order: 0,
/// #         created_at: Utc::now(),
/// #     }
/// # }
/// let items = vec![item(6_600_000), item(6_600_000)];
/// let gst = GstBreakup { cgst_paise: 100_000, sgst_paise: 100_000, igst_paise: 0 };
///
/// let totals = aggregate(&items, &gst).unwrap();
/// assert_eq!(totals.subtotal_paise, 13_200_000);
/// assert_eq!(totals.total_paise, 13_400_000);
/// assert_eq!(totals.amount_in_words, "One Lakh Thirty Four Thousand Rupees Only");
/// ```
pub fn aggregate(items: &[LineItem], gst: &GstBreakup) -> CoreResult<BillTotals> {
    if items.is_empty() {
        return Err(CoreError::EmptyBill);
    }
    if items.len() > MAX_BILL_ITEMS {
        return Err(CoreError::TooManyItems {
            max: MAX_BILL_ITEMS,
        });
    }

    validate_non_negative_paise("cgst", gst.cgst_paise)?;
    validate_non_negative_paise("sgst", gst.sgst_paise)?;
    validate_non_negative_paise("igst", gst.igst_paise)?;

    let subtotal = items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.total());
    let total_gst = gst.total();
    let total = subtotal + total_gst;

    Ok(BillTotals {
        subtotal_paise: subtotal.paise(),
        total_gst_paise: total_gst.paise(),
        total_paise: total.paise(),
        amount_in_words: amount_in_words(total),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
