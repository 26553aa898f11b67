//! # sona-db: Database Layer for Sona Billing
//!
//! This crate provides database access for the Sona jewellery billing system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sona Billing Data Flow                            │
//! │                                                                         │
//! │  Caller (desktop shell, CLI, tests)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sona-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │  Database    │   │ Repositories  │   │ Orchestration    │  │   │
//! │  │   │  (pool.rs)   │   │ (bill, stock, │   │ (billing.rs,     │  │   │
//! │  │   │              │   │  rate)        │   │  stock_sync.rs,  │  │   │
//! │  │   │ SqlitePool   │◄──│ BillRepo      │◄──│  numbering.rs)   │  │   │
//! │  │   │ Migrations   │   │ StockRepo     │   │                  │  │   │
//! │  │   └──────────────┘   └───────────────┘   └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  SQLite Database               sona-core                               │
//! │  (bills, stock, rates)         (pricing, aggregation, words)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (bill, stock, rate)
//! - [`numbering`] - Daily sequential bill number allocation
//! - [`stock_sync`] - Bill ↔ stock ledger synchronization
//! - [`billing`] - Bill lifecycle orchestration (create/update/delete)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sona_db::{BillingService, Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/sona.db");
//! let db = Database::new(config).await?;
//!
//! // Create a bill end to end: price, number, persist, move stock
//! let service = BillingService::new(&db, "SJ");
//! let receipt = service.create_bill(new_bill, "counter-1").await?;
//! println!("{} => {}", receipt.bill.bill_number, receipt.bill.amount_in_words);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod repository;
pub mod stock_sync;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Orchestration re-exports for convenience
pub use billing::{BillReceipt, BillingError, BillingService, NewBill, StockSyncStatus};
pub use numbering::{AllocatedNumber, BillNumberAllocator};
pub use stock_sync::{StockSynchronizer, SyncError, SyncOutcome};

// Repository re-exports for convenience
pub use repository::bill::BillRepository;
pub use repository::rate::RateRepository;
pub use repository::stock::StockRepository;
