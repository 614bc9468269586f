//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.transactions().checkout(&request, cashier)                 │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── checkout(&self, request, cashier)     ← atomic settlement         │
//! │  ├── get_all / get_by_date_range           ← history                   │
//! │  └── get_by_id                             ← detail                    │
//! │       │                                                                 │
//! │       │  uses product::fetch_many, discount::fetch_item_scoped         │
//! │       │  on the SAME connection (inside the storage transaction)       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Query helpers that must run inside another repository's transaction take
//! `&mut SqliteConnection` instead of the pool.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product reads, insert, delete
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`DiscountRepository`](discount::DiscountRepository) - Discounts and selectable globals
//! - [`TransactionRepository`](transaction::TransactionRepository) - Checkout and history
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Restocking purchases

/// Write transactions take the SQLite write lock at `BEGIN`, so concurrent
/// writers wait out `busy_timeout` instead of failing on lock upgrade.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

pub mod category;
pub mod discount;
pub mod product;
pub mod purchase;
pub mod transaction;
