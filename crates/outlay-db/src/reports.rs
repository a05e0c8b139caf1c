//! # Reports
//!
//! Read-only aggregation queries over the ledger.
//!
//! Every aggregate is computed fresh from committed rows on each call -
//! nothing here is cached or incrementally maintained, so a report can
//! never drift from the stored expenses. All sums run in integer cents
//! inside SQLite; `Money` values are constructed from the exact totals.
//!
//! Date ranges are inclusive on both ends and compare on the calendar date
//! only. Month windows use the real calendar (leap-year aware).

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqlitePool;

use outlay_core::calendar::month_bounds;
use outlay_core::validation::validate_month;
use outlay_core::{
    calendar, BudgetUtilization, CategoryTotal, Expense, Money, MonthlyTotal, ValidationError,
};

use crate::error::{StoreError, StoreResult};

/// Caller input error for a `(year, month)` pair chrono cannot represent.
fn invalid_calendar_month(year: i32, month: u32) -> StoreError {
    StoreError::Validation(ValidationError::InvalidFormat {
        field: "year".to_string(),
        reason: format!("{month}/{year} is outside the supported calendar range"),
    })
}

/// Read-only aggregation queries. Cheap to clone; holds only the pool.
#[derive(Debug, Clone)]
pub struct Reports {
    pool: SqlitePool,
}

impl Reports {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Reports { pool }
    }

    /// Lists the expenses dated within `[start, end]` inclusive, newest
    /// first, same-day ties in id order.
    pub async fn expenses_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, amount_cents, date, category_id, trip_id, vendor, location,
                   notes, receipt_path, created_at, updated_at
            FROM expenses
            WHERE date BETWEEN ?1 AND ?2
            ORDER BY date DESC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Total spend within `[start, end]` inclusive. Zero when no expenses
    /// fall in the range.
    pub async fn total_in_range(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE date BETWEEN ?1 AND ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Total spend of one category within `[start, end]` inclusive.
    pub async fn total_by_category_in_range(
        &self,
        category_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE category_id = ?1 AND date BETWEEN ?2 AND ?3
            "#,
        )
        .bind(category_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Total spend of one trip, across all dates.
    pub async fn total_by_trip(&self, trip_id: i64) -> StoreResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE trip_id = ?1",
        )
        .bind(trip_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Per-category spend within `[start, end]` inclusive.
    ///
    /// Carries one entry per existing category - a category with no spend
    /// in the range appears with a zero total. Ordered by category name.
    pub async fn category_breakdown(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<CategoryTotal>> {
        let breakdown = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT c.id AS category_id, c.name,
                   COALESCE(SUM(e.amount_cents), 0) AS total_cents
            FROM categories c
            LEFT JOIN expenses e
                   ON e.category_id = c.id AND e.date BETWEEN ?1 AND ?2
            GROUP BY c.id, c.name
            ORDER BY c.name ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(breakdown)
    }

    /// Monthly spend totals for the `month_count` months ending at the
    /// current month inclusive, chronological ascending.
    pub async fn monthly_trend(&self, month_count: i32) -> StoreResult<Vec<MonthlyTotal>> {
        let today = Utc::now().date_naive();
        self.monthly_trend_ending(month_count, today.year(), today.month())
            .await
    }

    /// Monthly spend totals for the `month_count` months ending at
    /// `(year, month)` inclusive, chronological ascending. A month with no
    /// expenses contributes a zero bucket. `month_count <= 0` yields an
    /// empty series.
    pub async fn monthly_trend_ending(
        &self,
        month_count: i32,
        year: i32,
        month: u32,
    ) -> StoreResult<Vec<MonthlyTotal>> {
        let mut trend = Vec::new();
        for (y, m) in calendar::trailing_months(year, month, month_count) {
            let (first, last) = month_bounds(y, m).ok_or_else(|| invalid_calendar_month(y, m))?;
            let total = self.total_in_range(first, last).await?;
            trend.push(MonthlyTotal {
                month: m,
                year: y,
                total_cents: total.cents(),
            });
        }

        Ok(trend)
    }

    /// Budget utilization for a `(category | overall, month, year)` key.
    ///
    /// Spend covers the full calendar month: the whole ledger for the
    /// overall key (`category_id = None`), one category's expenses
    /// otherwise. Without a budget the result is 0% and not exceeded;
    /// `exceeded` is true only when spend strictly exceeds the budget.
    pub async fn budget_utilization(
        &self,
        category_id: Option<i64>,
        month: u32,
        year: i32,
    ) -> StoreResult<BudgetUtilization> {
        validate_month(month)?;
        let (first, last) =
            month_bounds(year, month).ok_or_else(|| invalid_calendar_month(year, month))?;

        let spent_cents: i64 = match category_id {
            Some(id) => {
                self.total_by_category_in_range(id, first, last)
                    .await?
                    .cents()
            }
            None => self.total_in_range(first, last).await?.cents(),
        };

        let budget_cents: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT amount_cents FROM budgets
            WHERE COALESCE(category_id, 0) = COALESCE(?1, 0)
              AND month = ?2 AND year = ?3
            "#,
        )
        .bind(category_id)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        let (percent, exceeded) = match budget_cents {
            None => (0.0, false),
            // A zero budget can't divide: any spend is full utilization
            Some(0) => (if spent_cents > 0 { 100.0 } else { 0.0 }, spent_cents > 0),
            Some(budget) => (
                spent_cents as f64 * 100.0 / budget as f64,
                spent_cents > budget,
            ),
        };

        Ok(BudgetUtilization {
            budget_cents,
            spent_cents,
            percent,
            exceeded,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use outlay_core::{NewBudget, NewCategory, NewExpense, NewTrip, DEFAULT_CATEGORY_ID};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn spend(db: &Database, cents: i64, on: NaiveDate, category_id: Option<i64>) {
        db.expenses()
            .create(NewExpense {
                amount_cents: cents,
                date: on,
                category_id,
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
    async fn test_range_totals_inclusive_bounds() {
        let db = test_db().await;
        spend(&db, 100, date(2024, 3, 1), None).await;
        spend(&db, 200, date(2024, 3, 15), None).await;
        spend(&db, 400, date(2024, 3, 31), None).await;
        spend(&db, 800, date(2024, 4, 1), None).await;

        let total = db
            .reports()
            .total_in_range(date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();
        // Both boundary days included, April excluded
        assert_eq!(total.cents(), 700);

        let empty = db
            .reports()
            .total_in_range(date(2020, 1, 1), date(2020, 12, 31))
            .await
            .unwrap();
        assert!(empty.is_zero());
    }

    #[tokio::test]
    async fn test_expenses_in_range_ordering() {
        let db = test_db().await;
        spend(&db, 100, date(2024, 3, 10), None).await;
        spend(&db, 200, date(2024, 3, 20), None).await;
        spend(&db, 300, date(2024, 3, 10), None).await;

        let rows = db
            .reports()
            .expenses_in_range(date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();
        let amounts: Vec<i64> = rows.iter().map(|e| e.amount_cents).collect();
        assert_eq!(amounts, vec![200, 100, 300]);
    }

    #[tokio::test]
    async fn test_category_breakdown_includes_zero_categories() {
        let db = test_db().await;
        spend(&db, 1500, date(2024, 3, 5), Some(DEFAULT_CATEGORY_ID)).await;

        let breakdown = db
            .reports()
            .category_breakdown(date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();

        // Every seeded category appears, spend or not
        let total_categories = db.categories().count().await.unwrap() as usize;
        assert_eq!(breakdown.len(), total_categories);

        let names: Vec<&str> = breakdown.iter().map(|c| c.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let uncategorized = breakdown
            .iter()
            .find(|c| c.category_id == DEFAULT_CATEGORY_ID)
            .unwrap();
        assert_eq!(uncategorized.total_cents, 1500);
        assert!(breakdown
            .iter()
            .filter(|c| c.category_id != DEFAULT_CATEGORY_ID)
            .all(|c| c.total_cents == 0));
    }

    #[tokio::test]
    async fn test_total_by_trip_unrestricted_by_date() {
        let db = test_db().await;
        let trip = db
            .trips()
            .create(NewTrip {
                name: "Japan 2024".to_string(),
                description: None,
                start_date: Some(date(2024, 4, 1)),
                end_date: Some(date(2024, 4, 14)),
            })
            .await
            .unwrap();

        // Booked months before the trip itself
        db.expenses()
            .create(NewExpense {
                amount_cents: 80000,
                date: date(2024, 1, 10),
                category_id: None,
                trip_id: Some(trip.id),
                vendor: "Airline".to_string(),
                location: String::new(),
                notes: None,
                receipt_path: None,
            })
            .await
            .unwrap();
        spend(&db, 999, date(2024, 1, 10), None).await;

        let total = db.reports().total_by_trip(trip.id).await.unwrap();
        assert_eq!(total.cents(), 80000);
    }

    #[tokio::test]
    async fn test_monthly_trend_ascending_with_zero_buckets() {
        let db = test_db().await;
        spend(&db, 1000, date(2024, 1, 15), None).await;
        spend(&db, 3000, date(2024, 3, 2), None).await;
        spend(&db, 500, date(2024, 3, 30), None).await;

        let trend = db
            .reports()
            .monthly_trend_ending(3, 2024, 3)
            .await
            .unwrap();
        assert_eq!(trend.len(), 3);
        assert_eq!((trend[0].year, trend[0].month, trend[0].total_cents), (2024, 1, 1000));
        assert_eq!((trend[1].year, trend[1].month, trend[1].total_cents), (2024, 2, 0));
        assert_eq!((trend[2].year, trend[2].month, trend[2].total_cents), (2024, 3, 3500));

        assert!(db
            .reports()
            .monthly_trend_ending(0, 2024, 3)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_leap_february_spend_counted() {
        let db = test_db().await;
        spend(&db, 2900, date(2024, 2, 29), None).await;

        let trend = db
            .reports()
            .monthly_trend_ending(1, 2024, 2)
            .await
            .unwrap();
        assert_eq!(trend[0].total_cents, 2900);

        let utilization = db
            .reports()
            .budget_utilization(None, 2, 2024)
            .await
            .unwrap();
        assert_eq!(utilization.spent_cents, 2900);
    }

    #[tokio::test]
    async fn test_category_total_survives_category_delete() {
        let db = test_db().await;
        let food = db
            .categories()
            .create(NewCategory {
                name: "Food".to_string(),
                color: "#FF6B00".to_string(),
                icon: "utensils".to_string(),
            })
            .await
            .unwrap();

        let expense = db
            .expenses()
            .create(NewExpense {
                amount_cents: 1250,
                date: date(2024, 3, 5),
                category_id: Some(food.id),
                trip_id: None,
                vendor: "7-Eleven".to_string(),
                location: String::new(),
                notes: None,
                receipt_path: None,
            })
            .await
            .unwrap();

        let total = db
            .reports()
            .total_by_category_in_range(food.id, date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();
        assert_eq!(total.to_string(), "12.50");

        db.categories().delete(food.id).await.unwrap();

        // The spend moved to the default category; nothing is lost
        let survivor = db.expenses().get_by_id(expense.id).await.unwrap().unwrap();
        assert_eq!(survivor.category_id, DEFAULT_CATEGORY_ID);
        let total = db
            .reports()
            .total_by_category_in_range(DEFAULT_CATEGORY_ID, date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();
        assert_eq!(total.cents(), 1250);
    }

    #[tokio::test]
    async fn test_budget_utilization_exceeded() {
        let db = test_db().await;
        db.budgets()
            .create(NewBudget {
                amount_cents: 10000,
                month: 3,
                year: 2024,
                category_id: None,
            })
            .await
            .unwrap();
        spend(&db, 15000, date(2024, 3, 10), None).await;

        let utilization = db
            .reports()
            .budget_utilization(None, 3, 2024)
            .await
            .unwrap();
        assert_eq!(utilization.budget_cents, Some(10000));
        assert_eq!(utilization.spent_cents, 15000);
        assert!((utilization.percent - 150.0).abs() < f64::EPSILON);
        assert!(utilization.exceeded);
    }

    #[tokio::test]
    async fn test_budget_utilization_no_budget() {
        let db = test_db().await;
        spend(&db, 5000, date(2024, 3, 10), None).await;

        let utilization = db
            .reports()
            .budget_utilization(None, 3, 2024)
            .await
            .unwrap();
        assert_eq!(utilization.budget_cents, None);
        assert_eq!(utilization.spent_cents, 5000);
        assert_eq!(utilization.percent, 0.0);
        assert!(!utilization.exceeded);
    }

    #[tokio::test]
    async fn test_unrepresentable_year_is_caller_error() {
        let db = test_db().await;

        // chrono cannot represent this year; the input is wrong, not the medium
        let err = db
            .reports()
            .budget_utilization(None, 3, i32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = db
            .reports()
            .monthly_trend_ending(1, i32::MAX, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_budget_utilization_zero_budget() {
        let db = test_db().await;
        // Deliberate zero budget rows aren't creatable through the
        // repository (amount must be positive), but tolerate them anyway
        sqlx::query(
            "INSERT INTO budgets (amount_cents, month, year, category_id, created_at, updated_at) \
             VALUES (0, 3, 2024, NULL, datetime('now'), datetime('now'))",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let idle = db
            .reports()
            .budget_utilization(None, 3, 2024)
            .await
            .unwrap();
        assert_eq!(idle.percent, 0.0);
        assert!(!idle.exceeded);

        spend(&db, 1, date(2024, 3, 10), None).await;
        let spent = db
            .reports()
            .budget_utilization(None, 3, 2024)
            .await
            .unwrap();
        assert_eq!(spent.percent, 100.0);
        assert!(spent.exceeded);
    }

    #[tokio::test]
    async fn test_budget_utilization_per_category_scope() {
        let db = test_db().await;
        let other = db
            .categories()
            .create(NewCategory {
                name: "Groceries".to_string(),
                color: "#10B981".to_string(),
                icon: "cart".to_string(),
            })
            .await
            .unwrap();
        db.budgets()
            .create(NewBudget {
                amount_cents: 10000,
                month: 3,
                year: 2024,
                category_id: Some(other.id),
            })
            .await
            .unwrap();

        spend(&db, 4000, date(2024, 3, 5), Some(other.id)).await;
        // Spend in another category must not count against this budget
        spend(&db, 9000, date(2024, 3, 6), Some(DEFAULT_CATEGORY_ID)).await;

        let utilization = db
            .reports()
            .budget_utilization(Some(other.id), 3, 2024)
            .await
            .unwrap();
        assert_eq!(utilization.spent_cents, 4000);
        assert!((utilization.percent - 40.0).abs() < f64::EPSILON);
        assert!(!utilization.exceeded);
    }
}
