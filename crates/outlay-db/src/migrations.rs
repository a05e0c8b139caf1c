//! # Schema Migrations
//!
//! Versioned schema upgrades and first-run seeding for the ledger store.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Read schema_version (single scalar row, 0 = fresh store)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs stored version                         │
//! │       │                                                                 │
//! │       ├── v1 initial schema          ✓ (already applied)               │
//! │       ├── v2 add budgets             ✓ (already applied)               │
//! │       └── v3 add expense receipt path⬜ (NEW - needs to run)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Apply pending migrations strictly in order, each in its own           │
//! │  transaction together with the version bump                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  First run only: seed default + starter categories                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why a hand-rolled runner?
//! The version chain must fail closed: replaying an applied migration or
//! skipping one is a `Migration` error, never a silent re-apply. The runner
//! enforces `stored + 1 == next.version` on every step and rejects stores
//! whose version is newer than this binary knows.
//!
//! ## Adding New Migrations
//! 1. Append a `Migration` with the next version number to [`MIGRATIONS`]
//! 2. **NEVER** modify existing migrations - always add new ones
//! 3. Additive changes only (add table/column with a default)

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use outlay_core::{DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Migration Chain
// =============================================================================

/// A single named schema transformation.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Target schema version after applying. Versions start at 1 and are
    /// contiguous.
    pub version: i64,

    /// Human-readable name for logs.
    pub name: &'static str,

    /// The SQL to apply. May contain multiple statements.
    sql: &'static str,
}

/// The embedded migration chain, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial schema",
        sql: r#"
            CREATE TABLE categories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT    NOT NULL UNIQUE,
                color       TEXT    NOT NULL,
                icon        TEXT    NOT NULL,
                is_default  INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT    NOT NULL,
                updated_at  TEXT    NOT NULL
            );

            CREATE TABLE trips (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT    NOT NULL UNIQUE,
                description TEXT,
                start_date  TEXT,
                end_date    TEXT,
                created_at  TEXT    NOT NULL,
                updated_at  TEXT    NOT NULL
            );

            CREATE TABLE expenses (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
                date         TEXT    NOT NULL,
                category_id  INTEGER NOT NULL REFERENCES categories (id),
                trip_id      INTEGER REFERENCES trips (id),
                vendor       TEXT    NOT NULL,
                location     TEXT    NOT NULL DEFAULT '',
                notes        TEXT,
                created_at   TEXT    NOT NULL,
                updated_at   TEXT    NOT NULL
            );

            CREATE INDEX idx_expenses_date ON expenses (date);
            CREATE INDEX idx_expenses_category ON expenses (category_id);
            CREATE INDEX idx_expenses_trip ON expenses (trip_id);
        "#,
    },
    Migration {
        version: 2,
        name: "add budgets",
        sql: r#"
            -- Positivity is a repository rule (validate_budget_amount); the
            -- schema only rejects negatives, so zero-amount rows carried in
            -- from older data stay representable.
            CREATE TABLE budgets (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
                month        INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                year         INTEGER NOT NULL,
                category_id  INTEGER REFERENCES categories (id),
                created_at   TEXT    NOT NULL,
                updated_at   TEXT    NOT NULL
            );

            -- One budget per (category, month, year), treating the absent
            -- category as the reserved key 0 (no row ever has id 0 under
            -- AUTOINCREMENT). Plain UNIQUE would treat NULLs as distinct and
            -- allow unlimited "overall" budgets per month.
            CREATE UNIQUE INDEX idx_budgets_key
                ON budgets (COALESCE(category_id, 0), month, year);
        "#,
    },
    Migration {
        version: 3,
        name: "add expense receipt path",
        sql: r#"
            ALTER TABLE expenses ADD COLUMN receipt_path TEXT;
        "#,
    },
];

// =============================================================================
// Runner
// =============================================================================

/// Runs all pending migrations, then seeds default data on a fresh store.
///
/// ## Safety
/// - Idempotent for an up-to-date store
/// - Each migration commits atomically with its version bump
/// - Fails closed on replays, gaps, or a store newer than this binary
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    ensure_version_table(pool).await?;

    let mut current = stored_version(pool).await?;
    let latest = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);

    if current > latest {
        return Err(StoreError::Migration(format!(
            "store is at schema version {current}, but this build only knows up to {latest}"
        )));
    }

    let first_run = current == 0;
    info!(stored = current, latest, "checking schema version");

    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        apply_migration(pool, migration, current).await?;
        current = migration.version;
    }

    if first_run {
        seed_first_run(pool).await?;
    }

    Ok(())
}

/// Applies one migration on top of stored version `current`.
///
/// Fails closed with [`StoreError::Migration`] when the migration is already
/// applied (`version <= current`) or would leave a gap
/// (`version != current + 1`). The SQL and the version bump commit in one
/// transaction.
pub async fn apply_migration(
    pool: &SqlitePool,
    migration: &Migration,
    current: i64,
) -> StoreResult<()> {
    if migration.version <= current {
        return Err(StoreError::Migration(format!(
            "migration {} '{}' is already applied (store is at version {})",
            migration.version, migration.name, current
        )));
    }
    if migration.version != current + 1 {
        return Err(StoreError::Migration(format!(
            "migration {} '{}' would skip versions (store is at version {})",
            migration.version, migration.name, current
        )));
    }

    info!(version = migration.version, name = migration.name, "applying migration");

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
    sqlx::query("UPDATE schema_version SET version = ?1 WHERE id = 1")
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

/// Creates the scalar version record if the store is brand new.
async fn ensure_version_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id      INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO schema_version (id, version) VALUES (1, 0);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns the stored schema version (0 = fresh store).
pub async fn stored_version(pool: &SqlitePool) -> StoreResult<i64> {
    let version: i64 = sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Returns (known migrations, stored version) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, i64)> {
    Ok((MIGRATIONS.len(), stored_version(pool).await?))
}

// =============================================================================
// First-Run Seeding
// =============================================================================

/// Starter categories seeded on first run: (name, color, icon).
const STARTER_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Food & Dining", "#FF6B6B", "utensils"),
    ("Transport", "#4ECDC4", "bus"),
    ("Shopping", "#FFD166", "shopping-bag"),
    ("Entertainment", "#9B5DE5", "film"),
    ("Bills & Utilities", "#118AB2", "receipt"),
    ("Health", "#06D6A0", "heart-pulse"),
    ("Travel", "#F4845F", "plane"),
];

/// Seeds the default category (reserved id, `is_default = true`) and the
/// starter categories.
///
/// No-op when the default category already exists, so re-running first-run
/// seeding on an initialized store changes nothing - in particular, a
/// starter the user deleted stays deleted.
pub async fn seed_first_run(pool: &SqlitePool) -> StoreResult<()> {
    let already_seeded: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?1)")
            .bind(DEFAULT_CATEGORY_ID)
            .fetch_one(pool)
            .await?;

    if already_seeded {
        debug!("store already seeded, skipping");
        return Ok(());
    }

    info!("first run: seeding default and starter categories");

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO categories (id, name, color, icon, is_default, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
        "#,
    )
    .bind(DEFAULT_CATEGORY_ID)
    .bind(DEFAULT_CATEGORY_NAME)
    .bind("#9E9E9E")
    .bind("label")
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for (name, color, icon) in STARTER_CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (name, color, icon, is_default, created_at, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?4)
            "#,
        )
        .bind(name)
        .bind(color)
        .bind(icon)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(
        starters = STARTER_CATEGORIES.len(),
        "seeded default category and starters"
    );
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
