//! # Category Repository
//!
//! Database operations for spending categories, including the deletion
//! policies that keep expense and budget references intact.
//!
//! ## Deletion Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  delete(category) - one transaction                     │
//! │                                                                         │
//! │  is_default?  ──► yes ──► ProtectedEntity (nothing touched)            │
//! │       │no                                                               │
//! │       ▼                                                                 │
//! │  UPDATE expenses SET category_id = DEFAULT  (SET_DEFAULT)              │
//! │  DELETE FROM budgets WHERE category_id = ?  (CASCADE)                  │
//! │  DELETE FROM categories WHERE id = ?                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► change event (categories, expenses, budgets)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use outlay_core::validation::{validate_color, validate_name};
use outlay_core::{Category, CategoryUpdate, NewCategory, DEFAULT_CATEGORY_ID};

use crate::error::{StoreError, StoreResult};
use crate::live::{ChangeBus, Tables};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    gate: Arc<Mutex<()>>,
    bus: ChangeBus,
}

impl CategoryRepository {
    pub(crate) fn new(pool: SqlitePool, gate: Arc<Mutex<()>>, bus: ChangeBus) -> Self {
        CategoryRepository { pool, gate, bus }
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// - `Validation` - empty/overlong name, malformed color
    /// - `DuplicateName` - a category with the exact same name exists
    pub async fn create(&self, new: NewCategory) -> StoreResult<Category> {
        validate_name("name", &new.name)?;
        validate_color(&new.color)?;
        validate_name("icon", &new.icon)?;
        let name = new.name.trim().to_string();

        debug!(name = %name, "creating category");

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE name = ?1)")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;
        if taken {
            return Err(StoreError::duplicate("category", name));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO categories (name, color, icon, is_default, created_at, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?4)
            "#,
        )
        .bind(&name)
        .bind(&new.color)
        .bind(&new.icon)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;
        self.bus.publish(Tables::CATEGORIES);

        Ok(Category {
            id,
            name,
            color: new.color,
            icon: new.icon,
            is_default: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a category by id. `Ok(None)` when it doesn't exist.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, color, icon, is_default, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories, ordered by name ascending.
    pub async fn list(&self) -> StoreResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, color, icon, is_default, created_at, updated_at
            FROM categories
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Updates a category's name/color/icon.
    ///
    /// The `is_default` flag and the identity are immutable -
    /// [`CategoryUpdate`] cannot express them. Renaming the default category
    /// is allowed.
    pub async fn update(&self, id: i64, update: CategoryUpdate) -> StoreResult<Category> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(color) = &update.color {
            validate_color(color)?;
        }
        if let Some(icon) = &update.icon {
            validate_name("icon", icon)?;
        }

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, color, icon, is_default, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("category", id))?;

        let name = match update.name {
            Some(name) => name.trim().to_string(),
            None => existing.name.clone(),
        };
        if name != existing.name {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM categories WHERE name = ?1 AND id != ?2)",
            )
            .bind(&name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(StoreError::duplicate("category", name));
            }
        }
        let color = update.color.unwrap_or(existing.color);
        let icon = update.icon.unwrap_or(existing.icon);

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, color = ?3, icon = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&color)
        .bind(&icon)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.bus.publish(Tables::CATEGORIES);

        debug!(id, "updated category");

        Ok(Category {
            id,
            name,
            color,
            icon,
            is_default: existing.is_default,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Deletes a category, applying the deletion policies atomically:
    /// its expenses are reassigned to the default category (SET_DEFAULT)
    /// and its budgets are deleted (CASCADE).
    ///
    /// ## Errors
    /// - `NotFound` - no such category
    /// - `ProtectedEntity` - the default category cannot be deleted
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let is_default: Option<bool> =
            sqlx::query_scalar("SELECT is_default FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        match is_default {
            None => return Err(StoreError::not_found("category", id)),
            Some(true) => {
                return Err(StoreError::protected(
                    "the default category cannot be deleted",
                ))
            }
            Some(false) => {}
        }

        let now = Utc::now();

        // SET_DEFAULT: orphaned expenses fall back to the default category
        let reassigned = sqlx::query(
            "UPDATE expenses SET category_id = ?2, updated_at = ?3 WHERE category_id = ?1",
        )
        .bind(id)
        .bind(DEFAULT_CATEGORY_ID)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // CASCADE: budgets scoped to this category go with it
        let cascaded = sqlx::query("DELETE FROM budgets WHERE category_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.bus
            .publish(Tables::CATEGORIES | Tables::EXPENSES | Tables::BUDGETS);

        debug!(id, reassigned, cascaded, "deleted category");
        Ok(())
    }

    /// Counts categories (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use outlay_core::NewExpense;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            color: "#336699".to_string(),
            icon: "tag".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db.categories().create(new_category("Books")).await.unwrap();
        assert!(created.id > DEFAULT_CATEGORY_ID);
        assert!(!created.is_default);

        let fetched = db.categories().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        db.categories().create(new_category("Books")).await.unwrap();

        let err = db
            .categories()
            .create(new_category("Books"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));

        // Exact match required: different case is a different name
        assert!(db.categories().create(new_category("books")).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let db = test_db().await;
        db.categories().create(new_category("Zoo")).await.unwrap();
        db.categories().create(new_category("Art")).await.unwrap();

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_update_rejects_missing_and_duplicate() {
        let db = test_db().await;
        let a = db.categories().create(new_category("A")).await.unwrap();
        db.categories().create(new_category("B")).await.unwrap();

        let err = db
            .categories()
            .update(9999, CategoryUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = db
            .categories()
            .update(
                a.id,
                CategoryUpdate {
                    name: Some("B".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));
    }

    #[tokio::test]
    async fn test_default_category_rename_allowed_but_delete_protected() {
        let db = test_db().await;

        let renamed = db
            .categories()
            .update(
                DEFAULT_CATEGORY_ID,
                CategoryUpdate {
                    name: Some("Misc".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(renamed.is_default, "flag survives a rename");

        let err = db
            .categories()
            .delete(DEFAULT_CATEGORY_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ProtectedEntity { .. }));
    }

    #[tokio::test]
    async fn test_delete_reassigns_expenses_and_cascades_budgets() {
        let db = test_db().await;
        let food = db.categories().create(new_category("Food")).await.unwrap();

        let expense = db
            .expenses()
            .create(NewExpense {
                amount_cents: 1250,
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                category_id: Some(food.id),
                trip_id: None,
                vendor: "7-Eleven".to_string(),
                location: String::new(),
                notes: None,
                receipt_path: None,
            })
            .await
            .unwrap();

        db.budgets()
            .create(outlay_core::NewBudget {
                amount_cents: 10_000,
                month: 3,
                year: 2024,
                category_id: Some(food.id),
            })
            .await
            .unwrap();

        db.categories().delete(food.id).await.unwrap();

        // SET_DEFAULT: the expense survives, reassigned
        let survivor = db.expenses().get_by_id(expense.id).await.unwrap().unwrap();
        assert_eq!(survivor.category_id, DEFAULT_CATEGORY_ID);

        // CASCADE: the budget is gone
        assert!(db
            .budgets()
            .find_for(Some(food.id), 3, 2024)
            .await
            .unwrap()
            .is_none());

        assert!(db.categories().get_by_id(food.id).await.unwrap().is_none());
    }
}
