//! # sona-core: Pure Billing & Stock Logic for Sona POS
//!
//! This crate is the **heart** of Sona POS. It contains all billing maths and
//! stock ledger rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sona POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Counter Application                          │   │
//! │  │    Item entry ──► Bill preview ──► Print ──► Stock review      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    sona-db (Persistence Layer)                  │   │
//! │  │    BillingService, BillNumberAllocator, StockSynchronizer      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sona-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │  billing  │  │  ledger   │  │ numbering │  │   │
//! │  │   │ LineItem  │  │ GstBreakup│  │LedgerDelta│  │BillNumber │  │   │
//! │  │   │  maths    │  │ BillTotals│  │transitions│  │  format   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ItemInput, Bill, StockRecord, Rate, etc.)
//! - [`money`] - Money type with integer paise arithmetic (no floating point!)
//! - [`weight`] - Weight type with integer milligram arithmetic
//! - [`pricing`] - Per-item price computation (metal value, making, exchange)
//! - [`billing`] - Bill aggregation and GST breakup
//! - [`words`] - Indian-system amount-in-words rendering
//! - [`numbering`] - Bill number formatting and parsing
//! - [`ledger`] - Stock ledger balance transitions
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Integer Weight**: All weights are in milligrams (i64), exact to 0.001 g
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use sona_core::money::Money;
//! use sona_core::weight::Weight;
//!
//! // Create money from paise (never from floats!)
//! let rate = Money::from_rupees(6_000); // Rs 6,000.00 per gram
//!
//! // 10.000 g of metal at that rate
//! let net = Weight::from_milligrams(10_000);
//! let value = net.times_rate(rate);
//!
//! assert_eq!(value, Money::from_rupees(60_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod weight;
pub mod words;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use sona_core::Money` instead of
// `use sona_core::money::Money`

pub use billing::{aggregate, BillTotals, GstBreakup};
pub use error::{CoreError, ValidationError};
pub use ledger::{apply_adjustment, apply_in, apply_out, LedgerDelta};
pub use money::Money;
pub use numbering::BillNumber;
pub use pricing::{price_item, PricedItem};
pub use types::*;
pub use weight::Weight;
pub use words::amount_in_words;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Deduction applied to exchange (old gold) items, in basis points:
/// 300 bps = 3%.
///
/// ## Business Reason
/// Old metal taken in part-exchange is melted and refined; the 3% covers
/// refining loss. The deduction is taken once, on the whole of
/// `metal value + making charge + other charges`, and reduces the value
/// credited for the exchanged article.
pub const EXCHANGE_DEDUCTION_BPS: i64 = 300;

/// Low-stock threshold applied to stock records that do not set their own.
///
/// ## Business Reason
/// Five pieces is the reorder point the shop works with for most SKUs;
/// fast-moving items override it per record.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum items allowed on a single bill
///
/// ## Business Reason
/// Prevents runaway bills and keeps the printed invoice to a sane length.
/// Can be made configurable per shop in future versions.
pub const MAX_BILL_ITEMS: usize = 100;

/// Shop code used as the bill number prefix when none is configured.
pub const DEFAULT_SHOP_CODE: &str = "SJ";
