//! # Repository Module
//!
//! Database repository implementations for Sona Billing.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  BillingService / StockSynchronizer                                    │
//! │       │                                                                 │
//! │       │  db.bills().get_by_number("SJ/150124/001")                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BillRepository                                                        │
//! │  ├── insert(&self, bill, items)                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── latest_number_like(&self, pattern)                                │
//! │  └── sales_summary(&self, from, to)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (in-memory database per test)                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`bill::BillRepository`] - Bill + line item persistence and reporting
//! - [`stock::StockRepository`] - Stock records and the append-only ledger
//! - [`rate::RateRepository`] - Metal rate card management

pub mod bill;
pub mod rate;
pub mod stock;
