//! # Budget Repository
//!
//! Database operations for monthly budgets.
//!
//! ## Budget Key
//! A budget is addressed by `(category | overall, month, year)` and at most
//! one budget exists per key. The absent-category "overall" budget shares
//! the keyspace under the reserved id 0, mirroring the unique index
//! `COALESCE(category_id, 0)` in the schema. Only the amount is mutable;
//! re-keying a budget is a delete plus a create.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use outlay_core::validation::{validate_budget_amount, validate_month};
use outlay_core::{Budget, BudgetUpdate, NewBudget};

use crate::error::{StoreError, StoreResult};
use crate::live::{ChangeBus, Tables};

/// Repository for budget database operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    pool: SqlitePool,
    gate: Arc<Mutex<()>>,
    bus: ChangeBus,
}

impl BudgetRepository {
    pub(crate) fn new(pool: SqlitePool, gate: Arc<Mutex<()>>, bus: ChangeBus) -> Self {
        BudgetRepository { pool, gate, bus }
    }

    /// Creates a budget.
    ///
    /// ## Errors
    /// - `Validation` - non-positive amount or month outside 1-12
    /// - `NotFound` - the referenced category doesn't exist
    /// - `DuplicateName` - a budget already exists for the key; the prior
    ///   budget is untouched (create never upserts)
    pub async fn create(&self, new: NewBudget) -> StoreResult<Budget> {
        validate_budget_amount(new.amount_cents)?;
        validate_month(new.month)?;

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = new.category_id {
            let category_ok: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?1)")
                    .bind(category_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !category_ok {
                return Err(StoreError::not_found("category", category_id));
            }
        }

        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM budgets
                WHERE COALESCE(category_id, 0) = COALESCE(?1, 0)
                  AND month = ?2 AND year = ?3
            )
            "#,
        )
        .bind(new.category_id)
        .bind(new.month)
        .bind(new.year)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(StoreError::duplicate(
                "budget",
                budget_key(new.category_id, new.month, new.year),
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO budgets (amount_cents, month, year, category_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(new.amount_cents)
        .bind(new.month)
        .bind(new.year)
        .bind(new.category_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;
        self.bus.publish(Tables::BUDGETS);

        debug!(
            id,
            month = new.month,
            year = new.year,
            category_id = ?new.category_id,
            "created budget"
        );

        Ok(Budget {
            id,
            amount_cents: new.amount_cents,
            month: new.month,
            year: new.year,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a budget by id. `Ok(None)` when it doesn't exist.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Budget>> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, amount_cents, month, year, category_id, created_at, updated_at
            FROM budgets
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Lists all budgets, most recent month first.
    pub async fn list(&self) -> StoreResult<Vec<Budget>> {
        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, amount_cents, month, year, category_id, created_at, updated_at
            FROM budgets
            ORDER BY year DESC, month DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    /// Lists the budgets of one calendar month, the overall budget first,
    /// then per-category budgets by category id.
    pub async fn list_for_month(&self, month: u32, year: i32) -> StoreResult<Vec<Budget>> {
        validate_month(month)?;

        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, amount_cents, month, year, category_id, created_at, updated_at
            FROM budgets
            WHERE month = ?1 AND year = ?2
            ORDER BY (category_id IS NULL) DESC, category_id ASC
            "#,
        )
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    /// Looks up the budget for a key. `category_id = None` addresses the
    /// overall budget for the month.
    pub async fn find_for(
        &self,
        category_id: Option<i64>,
        month: u32,
        year: i32,
    ) -> StoreResult<Option<Budget>> {
        validate_month(month)?;

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, amount_cents, month, year, category_id, created_at, updated_at
            FROM budgets
            WHERE COALESCE(category_id, 0) = COALESCE(?1, 0)
              AND month = ?2 AND year = ?3
            "#,
        )
        .bind(category_id)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Updates a budget's amount. The key is immutable.
    pub async fn update(&self, id: i64, update: BudgetUpdate) -> StoreResult<Budget> {
        if let Some(amount) = update.amount_cents {
            validate_budget_amount(amount)?;
        }

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, amount_cents, month, year, category_id, created_at, updated_at
            FROM budgets
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("budget", id))?;

        let amount_cents = update.amount_cents.unwrap_or(existing.amount_cents);

        let now = Utc::now();
        sqlx::query("UPDATE budgets SET amount_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(amount_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.bus.publish(Tables::BUDGETS);

        Ok(Budget {
            amount_cents,
            updated_at: now,
            ..existing
        })
    }

    /// Deletes a budget. No cascading effects.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let _gate = self.gate.lock().await;

        let result = sqlx::query("DELETE FROM budgets WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("budget", id));
        }

        self.bus.publish(Tables::BUDGETS);

        debug!(id, "deleted budget");
        Ok(())
    }

    /// Counts budgets (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Human-readable budget key for duplicate errors, e.g. `"3/2024 (overall)"`.
fn budget_key(category_id: Option<i64>, month: u32, year: i32) -> String {
    match category_id {
        Some(id) => format!("{month}/{year} (category {id})"),
        None => format!("{month}/{year} (overall)"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use outlay_core::DEFAULT_CATEGORY_ID;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_budget(cents: i64, month: u32, year: i32, category_id: Option<i64>) -> NewBudget {
        NewBudget {
            amount_cents: cents,
            month,
            year,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_key() {
        let db = test_db().await;
        let overall = db
            .budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();
        let food = db
            .budgets()
            .create(new_budget(20000, 3, 2024, Some(DEFAULT_CATEGORY_ID)))
            .await
            .unwrap();

        let found = db.budgets().find_for(None, 3, 2024).await.unwrap().unwrap();
        assert_eq!(found, overall);
        let found = db
            .budgets()
            .find_for(Some(DEFAULT_CATEGORY_ID), 3, 2024)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, food);

        assert!(db.budgets().find_for(None, 4, 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected_and_prior_untouched() {
        let db = test_db().await;
        let first = db
            .budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();

        let err = db
            .budgets()
            .create(new_budget(99999, 3, 2024, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));

        // Never an upsert
        let kept = db.budgets().find_for(None, 3, 2024).await.unwrap().unwrap();
        assert_eq!(kept.amount_cents, first.amount_cents);
        assert_eq!(db.budgets().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_overall_and_category_budgets_coexist() {
        let db = test_db().await;
        db.budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();
        // Same month/year, different key half
        assert!(db
            .budgets()
            .create(new_budget(20000, 3, 2024, Some(DEFAULT_CATEGORY_ID)))
            .await
            .is_ok());
        // Same category, different month
        assert!(db
            .budgets()
            .create(new_budget(20000, 4, 2024, Some(DEFAULT_CATEGORY_ID)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_validation_and_dangling_category() {
        let db = test_db().await;

        let err = db
            .budgets()
            .create(new_budget(0, 3, 2024, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = db
            .budgets()
            .create(new_budget(100, 13, 2024, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = db
            .budgets()
            .create(new_budget(100, 3, 2024, Some(9999)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "category", .. }));
    }

    #[tokio::test]
    async fn test_update_amount_only() {
        let db = test_db().await;
        let budget = db
            .budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();

        let updated = db
            .budgets()
            .update(
                budget.id,
                BudgetUpdate {
                    amount_cents: Some(60000),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount_cents, 60000);
        assert_eq!(updated.month, 3);
        assert_eq!(updated.category_id, None);

        let err = db
            .budgets()
            .update(
                budget.id,
                BudgetUpdate {
                    amount_cents: Some(-5),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_for_month_overall_first() {
        let db = test_db().await;
        db.budgets()
            .create(new_budget(20000, 3, 2024, Some(DEFAULT_CATEGORY_ID)))
            .await
            .unwrap();
        db.budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();
        db.budgets()
            .create(new_budget(10000, 4, 2024, None))
            .await
            .unwrap();

        let march = db.budgets().list_for_month(3, 2024).await.unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].category_id, None);
        assert_eq!(march[1].category_id, Some(DEFAULT_CATEGORY_ID));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let budget = db
            .budgets()
            .create(new_budget(50000, 3, 2024, None))
            .await
            .unwrap();

        db.budgets().delete(budget.id).await.unwrap();
        assert!(db.budgets().get_by_id(budget.id).await.unwrap().is_none());

        let err = db.budgets().delete(budget.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
