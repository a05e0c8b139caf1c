//! # Database Pool Management
//!
//! Connection pool creation, configuration, and the store's concurrency
//! backbone.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  Host app startup                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations + seed     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────────┐                 │
//! │  │  SqlitePool (WAL, foreign keys on)                │                 │
//! │  │  + write gate (tokio::sync::Mutex)                │                 │
//! │  │  + change bus (tokio::sync::broadcast)            │                 │
//! │  └───────────────────────────────────────────────────┘                 │
//! │       │                                                                 │
//! │  Mutations: serialize on the write gate, commit one at a time,         │
//! │             then publish a change event                                │
//! │  Reads:     run concurrently on the pool, never take the gate,         │
//! │             observe only committed state                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block the writer, the writer doesn't block readers
//! - Readers observe either the pre- or post-state of an in-flight
//!   transaction, never a partially-applied one
//!
//! ## Lifecycle
//! The hosting application owns exactly one `Database`, created at startup
//! and closed at shutdown. It is injected into consumers; there is no
//! process-global instance.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use chrono::NaiveDate;
use outlay_core::{CategoryTotal, Expense};

use crate::error::{StoreError, StoreResult};
use crate::live::{spawn_subscription, ChangeBus, Subscription, Tables};
use crate::migrations;
use crate::reports::Reports;
use crate::repository::budget::BudgetRepository;
use crate::repository::category::CategoryRepository;
use crate::repository::expense::ExpenseRepository;
use crate::repository::trip::TripRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/outlay.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a local single-process app)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations (and first-run seeding) on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository, report, and subscription
/// access.
///
/// ## Concurrency Model
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Single logical writer                                                  │
/// │                                                                         │
/// │  create/update/delete ──► write gate ──► BEGIN..COMMIT ──► publish     │
/// │  (at most one mutation commits at a time; cascades run inside the      │
/// │   same transaction, so no observer ever sees a dangling reference)     │
/// │                                                                         │
/// │  reads / reports ──────────────► pool (no gate, committed state only)  │
/// │                                                                         │
/// │  subscriptions ──► spawned tasks; notification work never holds the    │
/// │                    write gate, so a slow subscriber cannot stall       │
/// │                    writers                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Write gate: mutations and migrations serialize here.
    gate: Arc<Mutex<()>>,

    /// Change bus feeding live query subscriptions.
    bus: ChangeBus,
}

impl Database {
    /// Creates a new database handle.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled (backstop for the integrity engine)
    /// 3. Creates the connection pool
    /// 4. Runs migrations and first-run seeding (if enabled)
    pub async fn new(config: DbConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing ledger database"
        );

        // sqlite://path with mode=rwc creates the file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::Storage(e.to_string()))?
            // WAL mode: readers don't block the writer and vice versa
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose the last
            // transaction on power loss
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys disabled for backwards
            // compatibility; the integrity engine relies on them as a
            // backstop
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            gate: Arc::new(Mutex::new(())),
            bus: ChangeBus::new(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs schema migrations and first-run seeding.
    ///
    /// Serialized against mutations on the write gate. Idempotent for an
    /// up-to-date store; fails closed on version inconsistencies.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        let _gate = self.gate.lock().await;
        info!("Running schema migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced read queries not covered by repositories. Prefer
    /// repository and report methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the category repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let categories = db.categories().list().await?;
    /// ```
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone(), self.gate.clone(), self.bus.clone())
    }

    /// Returns the trip repository.
    pub fn trips(&self) -> TripRepository {
        TripRepository::new(self.pool.clone(), self.gate.clone(), self.bus.clone())
    }

    /// Returns the expense repository.
    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool.clone(), self.gate.clone(), self.bus.clone())
    }

    /// Returns the budget repository.
    pub fn budgets(&self) -> BudgetRepository {
        BudgetRepository::new(self.pool.clone(), self.gate.clone(), self.bus.clone())
    }

    /// Returns the aggregation report reader.
    pub fn reports(&self) -> Reports {
        Reports::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Live query subscriptions
    // -------------------------------------------------------------------------

    /// Subscribes to the expenses whose date falls within `[start, end]`
    /// inclusive, ordered date descending then id ascending.
    ///
    /// Delivers the current rows immediately, then a new snapshot after
    /// every commit that adds/removes/edits a row in range. Commits that
    /// cannot change the result produce no snapshot.
    pub fn subscribe_expenses_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Subscription<Vec<Expense>> {
        let reports = self.reports();
        spawn_subscription(&self.bus, Tables::EXPENSES, move || {
            let reports = reports.clone();
            async move { reports.expenses_in_range(start, end).await }
        })
    }

    /// Subscribes to the per-category spend breakdown over `[start, end]`.
    ///
    /// Re-evaluated after commits touching expenses or categories (a new or
    /// deleted category changes the breakdown even with no expense rows).
    pub fn subscribe_category_breakdown(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Subscription<Vec<CategoryTotal>> {
        let reports = self.reports();
        spawn_subscription(
            &self.bus,
            Tables::EXPENSES | Tables::CATEGORIES,
            move || {
                let reports = reports.clone();
                async move { reports.category_breakdown(start, end).await }
            },
        )
    }

    /// Closes the database connection pool.
    ///
    /// Live subscriptions end; repository operations fail afterwards.
    /// Call on application shutdown.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
