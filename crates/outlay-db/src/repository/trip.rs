//! # Trip Repository
//!
//! Database operations for trips. Deleting a trip never deletes its
//! expenses: their trip reference is cleared in the same transaction
//! (SET_NULL).

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use outlay_core::validation::{validate_name, validate_text};
use outlay_core::{NewTrip, Trip, TripUpdate};

use crate::error::{StoreError, StoreResult};
use crate::live::{ChangeBus, Tables};

/// Repository for trip database operations.
#[derive(Debug, Clone)]
pub struct TripRepository {
    pool: SqlitePool,
    gate: Arc<Mutex<()>>,
    bus: ChangeBus,
}

impl TripRepository {
    pub(crate) fn new(pool: SqlitePool, gate: Arc<Mutex<()>>, bus: ChangeBus) -> Self {
        TripRepository { pool, gate, bus }
    }

    /// Creates a trip.
    ///
    /// ## Errors
    /// - `Validation` - empty/overlong name or description
    /// - `DuplicateName` - a trip with the exact same name exists
    pub async fn create(&self, new: NewTrip) -> StoreResult<Trip> {
        validate_name("name", &new.name)?;
        if let Some(description) = &new.description {
            validate_text("description", description)?;
        }
        let name = new.name.trim().to_string();

        debug!(name = %name, "creating trip");

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trips WHERE name = ?1)")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;
        if taken {
            return Err(StoreError::duplicate("trip", name));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO trips (name, description, start_date, end_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&name)
        .bind(&new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;
        self.bus.publish(Tables::TRIPS);

        Ok(Trip {
            id,
            name,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a trip by id. `Ok(None)` when it doesn't exist.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            SELECT id, name, description, start_date, end_date, created_at, updated_at
            FROM trips
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(trip)
    }

    /// Lists all trips: start date descending, trips without a start date
    /// last, ties broken by name ascending.
    pub async fn list(&self) -> StoreResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT id, name, description, start_date, end_date, created_at, updated_at
            FROM trips
            ORDER BY (start_date IS NULL) ASC, start_date DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    /// Updates a trip.
    ///
    /// Outer `None` leaves a field unchanged; `Some(None)` clears an
    /// optional field.
    pub async fn update(&self, id: i64, update: TripUpdate) -> StoreResult<Trip> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(Some(description)) = &update.description {
            validate_text("description", description)?;
        }

        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Trip>(
            r#"
            SELECT id, name, description, start_date, end_date, created_at, updated_at
            FROM trips
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("trip", id))?;

        let name = match update.name {
            Some(name) => name.trim().to_string(),
            None => existing.name.clone(),
        };
        if name != existing.name {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM trips WHERE name = ?1 AND id != ?2)",
            )
            .bind(&name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(StoreError::duplicate("trip", name));
            }
        }
        let description = update.description.unwrap_or(existing.description);
        let start_date = update.start_date.unwrap_or(existing.start_date);
        let end_date = update.end_date.unwrap_or(existing.end_date);

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE trips
            SET name = ?2, description = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(start_date)
        .bind(end_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.bus.publish(Tables::TRIPS);

        Ok(Trip {
            id,
            name,
            description,
            start_date,
            end_date,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Deletes a trip, clearing the trip reference on all its expenses in
    /// the same transaction (SET_NULL). The expenses themselves remain.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let _gate = self.gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trips WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StoreError::not_found("trip", id));
        }

        let now = Utc::now();

        // SET_NULL: expenses survive, detached from the trip
        let detached =
            sqlx::query("UPDATE expenses SET trip_id = NULL, updated_at = ?2 WHERE trip_id = ?1")
                .bind(id)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.bus.publish(Tables::TRIPS | Tables::EXPENSES);

        debug!(id, detached, "deleted trip");
        Ok(())
    }

    /// Counts trips (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips")
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

    fn new_trip(name: &str, start: Option<NaiveDate>) -> NewTrip {
        NewTrip {
            name: name.to_string(),
            description: None,
            start_date: start,
            end_date: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_duplicate_and_get() {
        let db = test_db().await;
        let trip = db
            .trips()
            .create(new_trip("Japan 2024", Some(date(2024, 4, 1))))
            .await
            .unwrap();

        let err = db
            .trips()
            .create(new_trip("Japan 2024", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));

        let fetched = db.trips().get_by_id(trip.id).await.unwrap().unwrap();
        assert_eq!(fetched, trip);
    }

    #[tokio::test]
    async fn test_list_ordering_absent_start_sorts_last() {
        let db = test_db().await;
        db.trips()
            .create(new_trip("Old", Some(date(2023, 1, 1))))
            .await
            .unwrap();
        db.trips().create(new_trip("Someday", None)).await.unwrap();
        db.trips()
            .create(new_trip("Recent", Some(date(2024, 6, 1))))
            .await
            .unwrap();
        db.trips().create(new_trip("Another", None)).await.unwrap();

        let names: Vec<String> = db
            .trips()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Recent", "Old", "Another", "Someday"]);
    }

    #[tokio::test]
    async fn test_update_clears_end_date() {
        let db = test_db().await;
        let trip = db
            .trips()
            .create(NewTrip {
                name: "Coast".to_string(),
                description: None,
                start_date: Some(date(2024, 5, 1)),
                end_date: Some(date(2024, 5, 10)),
            })
            .await
            .unwrap();

        // Some(None) clears: the trip becomes ongoing again
        let updated = db
            .trips()
            .update(
                trip.id,
                TripUpdate {
                    end_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.end_date, None);
        assert_eq!(updated.start_date, trip.start_date);
    }

    #[tokio::test]
    async fn test_delete_clears_expense_references() {
        let db = test_db().await;
        let trip = db
            .trips()
            .create(new_trip("Japan 2024", Some(date(2024, 4, 1))))
            .await
            .unwrap();

        let expense = db
            .expenses()
            .create(NewExpense {
                amount_cents: 5000,
                date: date(2024, 4, 3),
                category_id: None,
                trip_id: Some(trip.id),
                vendor: "JR East".to_string(),
                location: "Tokyo".to_string(),
                notes: None,
                receipt_path: None,
            })
            .await
            .unwrap();

        db.trips().delete(trip.id).await.unwrap();

        // SET_NULL: the expense remains, detached
        let survivor = db.expenses().get_by_id(expense.id).await.unwrap().unwrap();
        assert_eq!(survivor.trip_id, None);
        assert_eq!(survivor.amount_cents, 5000);

        let err = db.trips().delete(trip.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
