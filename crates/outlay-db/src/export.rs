//! # Export
//!
//! Read-only snapshot assembly for backup and interchange.
//!
//! A snapshot is a plain serializable struct of the four relations in their
//! canonical list orderings. It reads committed state through the pool and
//! never takes the write gate, so exporting a large ledger doesn't stall
//! writers. An optional date range narrows the expenses only - categories,
//! trips and budgets are always complete so every expense reference in the
//! snapshot resolves.

use serde::Serialize;
use tracing::debug;

use outlay_core::{Budget, Category, DateRange, Expense, Trip};

use crate::error::StoreResult;
use crate::pool::Database;

/// A point-in-time, serializable copy of the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    /// All categories, name ascending.
    pub categories: Vec<Category>,
    /// All trips, newest start first, undated last.
    pub trips: Vec<Trip>,
    /// Expenses (optionally range-filtered), date descending.
    pub expenses: Vec<Expense>,
    /// All budgets, most recent month first.
    pub budgets: Vec<Budget>,
}

/// Assembles a snapshot of the ledger.
///
/// `range` restricts the expenses to an inclusive date window; `None`
/// exports every expense.
pub async fn snapshot(db: &Database, range: Option<DateRange>) -> StoreResult<LedgerSnapshot> {
    let categories = db.categories().list().await?;
    let trips = db.trips().list().await?;
    let expenses = match range {
        Some(range) => db.reports().expenses_in_range(range.start, range.end).await?,
        None => db.expenses().list().await?,
    };
    let budgets = db.budgets().list().await?;

    debug!(
        categories = categories.len(),
        trips = trips.len(),
        expenses = expenses.len(),
        budgets = budgets.len(),
        "assembled ledger snapshot"
    );

    Ok(LedgerSnapshot {
        categories,
        trips,
        expenses,
        budgets,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::NaiveDate;
    use outlay_core::{NewBudget, NewExpense, NewTrip};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn spend(db: &Database, cents: i64, on: NaiveDate) {
        db.expenses()
            .create(NewExpense {
                amount_cents: cents,
                date: on,
                category_id: None,
                trip_id: None,
                vendor: "Vendor".to_string(),
                location: String::new(),
                notes: None,
                receipt_path: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_complete_and_serializable() {
        let db = test_db().await;
        db.trips()
            .create(NewTrip {
                name: "Japan 2024".to_string(),
                description: None,
                start_date: Some(date(2024, 4, 1)),
                end_date: None,
            })
            .await
            .unwrap();
        db.budgets()
            .create(NewBudget {
                amount_cents: 50000,
                month: 3,
                year: 2024,
                category_id: None,
            })
            .await
            .unwrap();
        spend(&db, 1250, date(2024, 3, 5)).await;

        let snap = snapshot(&db, None).await.unwrap();
        assert!(snap.categories.len() >= 8); // default + starters
        assert_eq!(snap.trips.len(), 1);
        assert_eq!(snap.expenses.len(), 1);
        assert_eq!(snap.budgets.len(), 1);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["expenses"][0]["amount_cents"], 1250);
        assert!(json["categories"].as_array().unwrap().len() >= 8);
    }

    #[tokio::test]
    async fn test_snapshot_range_filters_expenses_only() {
        let db = test_db().await;
        spend(&db, 100, date(2024, 2, 20)).await;
        spend(&db, 200, date(2024, 3, 5)).await;
        db.budgets()
            .create(NewBudget {
                amount_cents: 50000,
                month: 2,
                year: 2024,
                category_id: None,
            })
            .await
            .unwrap();

        let snap = snapshot(
            &db,
            Some(DateRange::new(date(2024, 3, 1), date(2024, 3, 31))),
        )
        .await
        .unwrap();

        assert_eq!(snap.expenses.len(), 1);
        assert_eq!(snap.expenses[0].amount_cents, 200);
        // Reference tables stay complete regardless of the range
        assert!(!snap.categories.is_empty());
        assert_eq!(snap.budgets.len(), 1);
    }
}
