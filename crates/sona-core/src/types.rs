//! # Domain Types
//!
//! Core domain types used throughout Sona POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Bill       │   │    LineItem     │   │   StockRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  bill_number    │   │  bill_id (FK)   │   │  (metal,purity, │       │
//! │  │  customer block │   │  weights (mg)   │   │   product) SKU  │       │
//! │  │  totals (paise) │   │  totals (paise) │   │  balances       │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │      Rate       │   │  MakingCharge   │   │StockTransaction │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  (metal,purity) │   │  Fixed          │   │  In / Out /     │       │
//! │  │  rate_paise     │   │  Percent (bps)  │   │  Adjustment     │       │
//! │  │  per gram/carat │   │  PerGram        │   │  append-only    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (bill_number, SKU triple, etc.) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;
use crate::weight::Weight;

// =============================================================================
// Metal Type
// =============================================================================

/// Top-level material category of an article.
///
/// Rates are maintained per (metal type, purity) pair; the stock ledger keys
/// SKUs on (metal type, purity, product name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MetalType {
    Gold,
    Silver,
    /// Rate is per carat; weights store milli-carats in the same scalar.
    Diamond,
    Platinum,
    AntiquePolki,
    Others,
}

impl fmt::Display for MetalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetalType::Gold => "Gold",
            MetalType::Silver => "Silver",
            MetalType::Diamond => "Diamond",
            MetalType::Platinum => "Platinum",
            MetalType::AntiquePolki => "Antique/Polki",
            MetalType::Others => "Others",
        };
        write!(f, "{label}")
    }
}

// =============================================================================
// Unit
// =============================================================================

/// How the article is counted and displayed on the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Piece,
    Gram,
}

impl Default for Unit {
    fn default() -> Self {
        Unit::Gram
    }
}

// =============================================================================
// Making Charge
// =============================================================================

/// Storage discriminant for [`MakingCharge`] (the `(kind, value)` columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MakingChargeKind {
    Fixed,
    Percent,
    PerGram,
}

/// Fabrication-fee policy for one article.
///
/// ## Why Three Policies?
/// Shops quote making charges three ways depending on the article:
/// a flat fee for standard pieces, a percentage of metal value for
/// ornate work, or a per-gram rate for chains and bangles. The policy
/// is frozen onto the line item at billing time.
///
/// Persisted flattened to a `(kind, value)` column pair - see
/// [`MakingCharge::kind`], [`MakingCharge::value`] and
/// [`MakingCharge::from_parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MakingCharge {
    /// Flat fabrication fee, independent of weight.
    Fixed { amount_paise: i64 },
    /// Percent of metal value, in basis points (1000 = 10%).
    Percent { rate_bps: i64 },
    /// Fee per gram of net weight.
    PerGram { rate_paise: i64 },
}

impl MakingCharge {
    /// Storage discriminant for the `(kind, value)` column pair.
    pub fn kind(&self) -> MakingChargeKind {
        match self {
            MakingCharge::Fixed { .. } => MakingChargeKind::Fixed,
            MakingCharge::Percent { .. } => MakingChargeKind::Percent,
            MakingCharge::PerGram { .. } => MakingChargeKind::PerGram,
        }
    }

    /// Raw policy value for the `(kind, value)` column pair.
    pub fn value(&self) -> i64 {
        match self {
            MakingCharge::Fixed { amount_paise } => *amount_paise,
            MakingCharge::Percent { rate_bps } => *rate_bps,
            MakingCharge::PerGram { rate_paise } => *rate_paise,
        }
    }

    /// Reconstructs the policy from its persisted `(kind, value)` pair.
    pub fn from_parts(kind: MakingChargeKind, value: i64) -> Self {
        match kind {
            MakingChargeKind::Fixed => MakingCharge::Fixed { amount_paise: value },
            MakingChargeKind::Percent => MakingCharge::Percent { rate_bps: value },
            MakingChargeKind::PerGram => MakingCharge::PerGram { rate_paise: value },
        }
    }
}

// =============================================================================
// Item Input
// =============================================================================

/// A raw article submitted for pricing.
///
/// Everything the counter operator enters for one line of the bill, before
/// any money math has run. [`crate::pricing::price_item`] validates this and
/// computes the derived values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    /// Display name, also the third component of the SKU triple.
    pub product_name: String,
    pub metal_type: MetalType,
    /// Material-grade label within the metal type (e.g. "22K", "99.9%").
    pub purity: String,
    pub unit: Unit,
    /// Piece count; drives the stock quantity delta, not the price.
    pub quantity: i64,
    /// As weighed, in milligrams.
    pub gross_weight_mg: i64,
    /// Stone/wastage deduction, in milligrams.
    pub less_weight_mg: i64,
    pub making_charge: MakingCharge,
    /// Absolute discount on the making charge, in paise.
    pub making_discount_paise: i64,
    /// Stone setting, hallmarking, certificates - flat add-ons in paise.
    pub other_charges_paise: i64,
    /// Old article taken back from the customer (3% deduction applies).
    pub is_exchange: bool,
}

impl ItemInput {
    /// Returns the gross weight as a Weight.
    #[inline]
    pub fn gross_weight(&self) -> Weight {
        Weight::from_milligrams(self.gross_weight_mg)
    }

    /// Returns the less weight as a Weight.
    #[inline]
    pub fn less_weight(&self) -> Weight {
        Weight::from_milligrams(self.less_weight_mg)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A priced line on a persisted bill.
/// Uses snapshot pattern: inputs and derived values are frozen at billing
/// time; edits replace items wholesale rather than mutating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub id: String,
    pub bill_id: String,

    pub product_name: String,
    pub metal_type: MetalType,
    pub purity: String,
    pub unit: Unit,
    pub quantity: i64,
    pub gross_weight_mg: i64,
    pub less_weight_mg: i64,
    /// gross − less, validated non-negative before pricing.
    pub net_weight_mg: i64,

    /// Rate per gram (per carat for diamond) at billing time, frozen.
    pub rate_paise: i64,
    pub making_charge_kind: MakingChargeKind,
    pub making_charge_value: i64,
    pub making_discount_paise: i64,
    pub other_charges_paise: i64,
    pub is_exchange: bool,

    /// net weight × rate.
    pub metal_value_paise: i64,
    /// After policy and discount, floored at zero.
    pub making_charge_paise: i64,
    /// 3% of (metal + making + other) for exchange items, else zero.
    pub exchange_deduction_paise: i64,
    pub total_paise: i64,

    /// Position on the printed bill.
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the net weight as a Weight.
    #[inline]
    pub fn net_weight(&self) -> Weight {
        Weight::from_milligrams(self.net_weight_mg)
    }

    /// Returns the frozen rate as Money.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_paise(self.rate_paise)
    }

    /// Returns the metal value as Money.
    #[inline]
    pub fn metal_value(&self) -> Money {
        Money::from_paise(self.metal_value_paise)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    /// Reconstructs the making-charge policy from the persisted pair.
    #[inline]
    pub fn making_charge(&self) -> MakingCharge {
        MakingCharge::from_parts(self.making_charge_kind, self.making_charge_value)
    }

    /// The stock-keeping key this line touches.
    #[inline]
    pub fn sku(&self) -> String {
        format!("{}/{}/{}", self.metal_type, self.purity, self.product_name)
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// UPI transfer (GPay, PhonePe, etc.).
    Upi,
    BankTransfer,
    /// Informal shop credit, settled later.
    Credit,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Fully settled at the counter.
    Paid,
    /// Nothing received yet.
    Pending,
    /// Advance received, balance outstanding.
    Partial,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Paid
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A persisted invoice.
///
/// Financial invariant: `subtotal`, `total_gst`, `total` and
/// `amount_in_words` are always recomputed from the current item set and
/// GST breakup on every create/update - never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: String,
    /// Business identifier, `SHOPCODE/DDMMYY/NNN`. Unique.
    pub bill_number: String,
    pub bill_date: DateTime<Utc>,

    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub customer_dob: Option<NaiveDate>,
    /// PAN is mandatory above the cash-purchase reporting threshold;
    /// capture is the operator's responsibility, storage is ours.
    pub customer_pan: Option<String>,
    pub customer_aadhaar: Option<String>,

    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub igst_paise: i64,
    pub total_gst_paise: i64,
    pub total_paise: i64,
    pub amount_in_words: String,

    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_paise(self.subtotal_paise)
    }

    /// Returns the total GST as Money.
    #[inline]
    pub fn total_gst(&self) -> Money {
        Money::from_paise(self.total_gst_paise)
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// One stock-keeping unit, keyed by the unique
/// (metal_type, purity, product_name) triple.
///
/// Balances only ever change through the ledger transitions in
/// [`crate::ledger`]; both are clamped at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockRecord {
    pub id: String,
    pub metal_type: MetalType,
    pub purity: String,
    pub product_name: String,

    /// On-hand piece count, never negative.
    pub quantity: i64,
    /// On-hand weight in milligrams, never negative.
    pub weight_mg: i64,

    pub cost_price_paise: Option<i64>,
    pub selling_price_paise: Option<i64>,

    pub low_stock_threshold: i64,
    /// Derived: `quantity <= low_stock_threshold`, recomputed on every
    /// transition, never cached separately.
    pub is_low_stock: bool,

    /// Optimistic-lock counter; bumped on every balance write.
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Returns the on-hand weight as a Weight.
    #[inline]
    pub fn weight(&self) -> Weight {
        Weight::from_milligrams(self.weight_mg)
    }

    /// Returns the reference cost price as Money, if set.
    #[inline]
    pub fn cost_price(&self) -> Option<Money> {
        self.cost_price_paise.map(Money::from_paise)
    }

    /// Returns the reference selling price as Money, if set.
    #[inline]
    pub fn selling_price(&self) -> Option<Money> {
        self.selling_price_paise.map(Money::from_paise)
    }

    /// Human-readable SKU label for logs and error context.
    #[inline]
    pub fn sku(&self) -> String {
        format!("{}/{}/{}", self.metal_type, self.purity, self.product_name)
    }
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// Direction of a stock ledger transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockTransactionKind {
    /// Stock received (purchase, exchange taken in, sale revert).
    In,
    /// Stock issued (sale, exchange revert).
    Out,
    /// Physical-count correction to absolute balances.
    Adjustment,
}

/// One append-only audit row on a stock record.
///
/// Rows are never updated or deleted; the running balances must stay
/// explicable as the sum of their applied deltas.
///
/// ## Applied vs Requested
/// `quantity_delta` / `weight_delta_mg` are the **applied** signed changes,
/// post-clamping. `quantity_requested` / `weight_requested_mg` keep the
/// submitted magnitudes, so an out-transition truncated by the
/// never-negative clamp stays visible in the audit trail instead of
/// masquerading as fully applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransaction {
    pub id: String,
    pub stock_record_id: String,
    pub kind: StockTransactionKind,

    pub quantity_delta: i64,
    pub weight_delta_mg: i64,
    pub quantity_requested: i64,
    pub weight_requested_mg: i64,

    /// Bill that triggered the transition, if any.
    pub bill_number: Option<String>,
    /// Free-text reason for manual transitions.
    pub note: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Rate
// =============================================================================

/// Current price-per-gram (per carat for diamond) for a
/// (metal_type, purity) pair. Exactly one active rate per pair.
///
/// Consumed by pricing as a lookup table; pricing never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Rate {
    pub id: String,
    pub metal_type: MetalType,
    pub purity: String,
    pub rate_paise: i64,
    /// Whether GST is normally charged on articles at this rate.
    pub gst_applicable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rate {
    /// Returns the rate as Money.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_paise(self.rate_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
