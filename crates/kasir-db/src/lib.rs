//! # kasir-db: Database Layer for Kasir
//!
//! SQLite storage via sqlx, plus the checkout transaction boundary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir Data Flow                                  │
//! │                                                                         │
//! │  POST /api/transactions                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │  │  (embedded)  │  │   │
//! │  │   │               │    │ TransactionRepo ─┼──┼─► kasir-core │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo      │  │   Settlement │  │   │
//! │  │   │               │    │ DiscountRepo     │  │              │  │   │
//! │  │   │               │    │ PurchaseRepo     │  │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kasir.db")).await?;
//! let sale = db.transactions().checkout(&request, Some("kasir-01")).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::discount::{DiscountRepository, NewDiscount};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::purchase::PurchaseRepository;
pub use repository::transaction::{DateRange, TransactionRepository};
