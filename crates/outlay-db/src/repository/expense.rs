//! # Expense Repository
//!
//! Database operations for expense records - the atoms of the ledger.
//!
//! ## Reference Resolution
//! An expense's category reference is required and always resolvable: a
//! missing category on create falls back to the default category, and both
//! the category and trip references are verified inside the insert/update
//! transaction. Deletion policies on the parent side (see the category and
//! trip repositories) keep them resolvable afterwards.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use outlay_core::validation::{validate_expense_amount, validate_text, validate_vendor};
use outlay_core::{Expense, ExpenseDraft, ExpenseUpdate, NewExpense, DEFAULT_CATEGORY_ID};

use crate::error::{StoreError, StoreResult};
use crate::live::{ChangeBus, Tables};

/// Column list shared by every expense read.
const EXPENSE_COLUMNS: &str = "id, amount_cents, date, category_id, trip_id, vendor, location, \
                               notes, receipt_path, created_at, updated_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
    gate: Arc<Mutex<()>>,
    bus: ChangeBus,
}

impl ExpenseRepository {
    pub(crate) fn new(pool: SqlitePool, gate: Arc<Mutex<()>>, bus: ChangeBus) -> Self {
        ExpenseRepository { pool, gate, bus }
    }

    /// Creates an expense.
    ///
    /// An absent `category_id` falls back to the default category. Both the
    /// category and the trip (when given) must resolve.
    ///
    /// ## Errors
    /// - `Validation` - negative amount, empty vendor, overlong text
    /// - `NotFound` - the referenced category or trip doesn't exist
    pub async fn create(&self, new: NewExpense) -> StoreResult<Expense> {
        validate_expense_amount(new.amount_cents)?;
        validate_vendor(&new.vendor)?;
        validate_text("location", &new.location)?;
        if let Some(notes) = &new.notes {
            validate_text("notes", notes)?;
        }
        if let Some(path) = &new.receipt_path {
            validate_text("receipt_path", path)?;
        }
        let vendor = new.vendor.trim().to_string();

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let category_id = new.category_id.unwrap_or(DEFAULT_CATEGORY_ID);
        let category_ok: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?1)")
                .bind(category_id)
                .fetch_one(&mut *tx)
                .await?;
        if !category_ok {
            return Err(StoreError::not_found("category", category_id));
        }

        if let Some(trip_id) = new.trip_id {
            let trip_ok: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trips WHERE id = ?1)")
                    .bind(trip_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !trip_ok {
                return Err(StoreError::not_found("trip", trip_id));
            }
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO expenses
                (amount_cents, date, category_id, trip_id, vendor, location,
                 notes, receipt_path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(new.amount_cents)
        .bind(new.date)
        .bind(category_id)
        .bind(new.trip_id)
        .bind(&vendor)
        .bind(&new.location)
        .bind(&new.notes)
        .bind(&new.receipt_path)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;
        self.bus.publish(Tables::EXPENSES);

        debug!(id, amount_cents = new.amount_cents, "created expense");

        Ok(Expense {
            id,
            amount_cents: new.amount_cents,
            date: new.date,
            category_id,
            trip_id: new.trip_id,
            vendor,
            location: new.location,
            notes: new.notes,
            receipt_path: new.receipt_path,
            created_at: now,
            updated_at: now,
        })
    }

    /// Records a completed draft from the capture/OCR collaborator.
    ///
    /// The draft carries only what a receipt scan yields (amount, date,
    /// vendor, image path); the expense lands in the default category for
    /// the user to recategorize. The store records the receipt path string
    /// as-is and never opens the file.
    pub async fn create_from_draft(&self, draft: ExpenseDraft) -> StoreResult<Expense> {
        self.create(NewExpense {
            amount_cents: draft.amount_cents,
            date: draft.date,
            category_id: None,
            trip_id: None,
            vendor: draft.vendor,
            location: String::new(),
            notes: None,
            receipt_path: draft.receipt_path,
        })
        .await
    }

    /// Gets an expense by id. `Ok(None)` when it doesn't exist.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists all expenses: date descending, ties broken by id ascending
    /// (stable and deterministic).
    pub async fn list(&self) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Lists the expenses of one category, newest first.
    pub async fn list_by_category(&self, category_id: i64) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE category_id = ?1 \
             ORDER BY date DESC, id ASC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Lists the expenses of one trip, newest first.
    pub async fn list_by_trip(&self, trip_id: i64) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE trip_id = ?1 \
             ORDER BY date DESC, id ASC"
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Updates an expense.
    ///
    /// Outer `None` leaves a field unchanged; `Some(None)` clears an
    /// optional field (detach from trip, drop notes/receipt). A changed
    /// category or trip reference must resolve.
    pub async fn update(&self, id: i64, update: ExpenseUpdate) -> StoreResult<Expense> {
        if let Some(amount) = update.amount_cents {
            validate_expense_amount(amount)?;
        }
        if let Some(vendor) = &update.vendor {
            validate_vendor(vendor)?;
        }
        if let Some(location) = &update.location {
            validate_text("location", location)?;
        }
        if let Some(Some(notes)) = &update.notes {
            validate_text("notes", notes)?;
        }
        if let Some(Some(path)) = &update.receipt_path {
            validate_text("receipt_path", path)?;
        }

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("expense", id))?;

        let amount_cents = update.amount_cents.unwrap_or(existing.amount_cents);
        let date = update.date.unwrap_or(existing.date);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let trip_id = update.trip_id.unwrap_or(existing.trip_id);
        let vendor = match update.vendor {
            Some(vendor) => vendor.trim().to_string(),
            None => existing.vendor,
        };
        let location = update.location.unwrap_or(existing.location);
        let notes = update.notes.unwrap_or(existing.notes);
        let receipt_path = update.receipt_path.unwrap_or(existing.receipt_path);

        if category_id != existing.category_id {
            let category_ok: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?1)")
                    .bind(category_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !category_ok {
                return Err(StoreError::not_found("category", category_id));
            }
        }
        if let Some(trip) = trip_id {
            if trip_id != existing.trip_id {
                let trip_ok: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trips WHERE id = ?1)")
                        .bind(trip)
                        .fetch_one(&mut *tx)
                        .await?;
                if !trip_ok {
                    return Err(StoreError::not_found("trip", trip));
                }
            }
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE expenses
            SET amount_cents = ?2, date = ?3, category_id = ?4, trip_id = ?5,
                vendor = ?6, location = ?7, notes = ?8, receipt_path = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(date)
        .bind(category_id)
        .bind(trip_id)
        .bind(&vendor)
        .bind(&location)
        .bind(&notes)
        .bind(&receipt_path)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.bus.publish(Tables::EXPENSES);

        Ok(Expense {
            id,
            amount_cents,
            date,
            category_id,
            trip_id,
            vendor,
            location,
            notes,
            receipt_path,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Deletes an expense. No cascading effects.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let _gate = self.gate.lock().await;

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("expense", id));
        }

        self.bus.publish(Tables::EXPENSES);

        debug!(id, "deleted expense");
        Ok(())
    }

    /// Counts expenses (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
