//! # outlay-db: Storage Engine for the Outlay Ledger
//!
//! This crate provides local persistence for the Outlay expense ledger.
//! It uses SQLite for offline-first storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Outlay Data Flow                                 │
//! │                                                                         │
//! │  UI / state layer (create_expense, subscribe_category_breakdown)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     outlay-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │ Repositories  │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ SqlitePool    │    │ CategoryRepo  │    │ v1 schema    │   │   │
//! │  │   │ Write gate    │◄───│ ExpenseRepo   │    │ v2 budgets   │   │   │
//! │  │   │ Change bus    │    │ BudgetRepo .. │    │ v3 receipts  │   │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   ┌───────────────┐    ┌───────────────┐                       │   │
//! │  │   │   Reports     │    │  Live queries │                       │   │
//! │  │   │ (reports.rs)  │    │   (live.rs)   │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   <app data dir>/outlay.db                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate, change bus, repository access
//! - [`migrations`] - Embedded versioned migrations and first-run seeding
//! - [`repository`] - Entity repositories (category, trip, expense, budget)
//! - [`reports`] - Read-only aggregation queries
//! - [`live`] - Change events and live-query subscriptions
//! - [`export`] - Serializable ledger snapshots
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use outlay_db::{Database, DbConfig};
//!
//! // Open (or create) the ledger; migrations run automatically
//! let db = Database::new(DbConfig::new("path/to/outlay.db")).await?;
//!
//! // Use repositories
//! let expense = db.expenses().create(new_expense).await?;
//! let breakdown = db.reports().category_breakdown(start, end).await?;
//!
//! // Watch a query
//! let mut sub = db.subscribe_expenses_in_range(start, end);
//! while let Some(rows) = sub.recv().await { /* render */ }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod live;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use export::{snapshot, LedgerSnapshot};
pub use live::{ChangeEvent, Subscription, Tables};
pub use pool::{Database, DbConfig};
pub use reports::Reports;

// Repository re-exports for convenience
pub use repository::budget::BudgetRepository;
pub use repository::category::CategoryRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::trip::TripRepository;
