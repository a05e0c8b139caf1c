//! # Domain Types
//!
//! Core domain types used throughout the Outlay ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │      Trip       │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  amount_cents   │       │
//! │  │  color / icon   │   │  start/end date │   │  category_id FK │       │
//! │  │  is_default     │   │  description    │   │  trip_id FK?    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │          ▲                      ▲                     │                 │
//! │          │ 1─*                  │ 0..1─*              │                 │
//! │          └──────────────────────┴─────────────────────┘                 │
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │     Budget      │   unique per (category_id | overall, month, year) │
//! │  │  ─────────────  │                                                    │
//! │  │  amount_cents   │                                                    │
//! │  │  month / year   │                                                    │
//! │  │  category_id?   │   absent = overall budget for the month           │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every entity has an `id: i64` issued by SQLite `AUTOINCREMENT`:
//! stable, monotonically increasing, never reused after deletion.
//! References between entities are always by id, never by embedding.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A spending category ("Food & Dining", "Transport", ...).
///
/// Exactly one category carries `is_default = true` (the "Uncategorized"
/// fallback, seeded at first run with the reserved id
/// [`crate::DEFAULT_CATEGORY_ID`]). The default category can be renamed but
/// never deleted, and its flag and identity are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    /// Unique identifier (AUTOINCREMENT).
    pub id: i64,

    /// Unique display name (exact-match uniqueness, case-sensitive).
    pub name: String,

    /// Display color as a hex string (`#RRGGBB`).
    pub color: String,

    /// Icon reference for the presentation layer (icon name, not a file).
    pub icon: String,

    /// Whether this is the protected fallback category.
    pub is_default: bool,

    /// When the category was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the category was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// True when deletion policies protect this row.
    #[inline]
    pub fn is_protected(&self) -> bool {
        self.is_default
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Partial update for a category.
///
/// `None` fields are left unchanged. The `is_default` flag and the identity
/// are deliberately not expressible here - they are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

// =============================================================================
// Trip
// =============================================================================

/// A trip grouping expenses ("Japan 2024").
///
/// Deleting a trip never deletes its expenses; their trip reference is
/// cleared instead (SET_NULL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Trip {
    pub id: i64,

    /// Unique display name.
    pub name: String,

    pub description: Option<String>,

    /// First day of the trip, if scheduled.
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the trip. Absent means the trip is ongoing.
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a trip.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTrip {
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
}

/// Partial update for a trip.
///
/// Outer `None` leaves the field unchanged; `Some(None)` clears an optional
/// field (e.g., marks a trip as ongoing again by clearing `end_date`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    #[ts(as = "Option<Option<String>>")]
    pub start_date: Option<Option<NaiveDate>>,
    #[ts(as = "Option<Option<String>>")]
    pub end_date: Option<Option<NaiveDate>>,
}

// =============================================================================
// Expense
// =============================================================================

/// A single expense record - the atom of the ledger.
///
/// ## Invariants
/// - `amount_cents >= 0`
/// - `category_id` always resolves to an existing category (the store
///   reassigns to the default category when its parent is deleted)
/// - `trip_id`, when present, always resolves to an existing trip (the store
///   clears it when the trip is deleted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: i64,

    /// Amount in cents (>= 0). See [`Money`] for the exact-decimal contract.
    pub amount_cents: i64,

    /// Calendar date of the expense. No time-of-day component is stored;
    /// range queries compare whole days.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Required category reference (never dangling).
    pub category_id: i64,

    /// Optional trip reference.
    pub trip_id: Option<i64>,

    /// Who was paid ("7-Eleven", "JR East").
    pub vendor: String,

    /// Free-form location text. May be empty (capture drafts carry none).
    pub location: String,

    pub notes: Option<String>,

    /// Path to a receipt image produced by the capture collaborator.
    /// The store only records the string; it never opens the file.
    pub receipt_path: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the amount as a Money type.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    /// Amount in cents (>= 0).
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Absent falls back to the default category.
    pub category_id: Option<i64>,
    pub trip_id: Option<i64>,
    pub vendor: String,
    pub location: String,
    pub notes: Option<String>,
    pub receipt_path: Option<String>,
}

/// A completed expense draft handed over by the capture/OCR collaborator.
///
/// The capture layer scans a receipt, extracts amount/date/vendor, saves the
/// image, and submits this draft. The store validates and records it with the
/// default category; the user can recategorize later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseDraft {
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub vendor: String,
    pub receipt_path: Option<String>,
}

/// Partial update for an expense.
///
/// Outer `None` leaves the field unchanged; `Some(None)` clears an optional
/// field (detach from trip, drop notes or receipt).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseUpdate {
    pub amount_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub trip_id: Option<Option<i64>>,
    pub vendor: Option<String>,
    pub location: Option<String>,
    pub notes: Option<Option<String>>,
    pub receipt_path: Option<Option<String>>,
}

// =============================================================================
// Budget
// =============================================================================

/// A monthly spending budget.
///
/// At most one budget exists per `(category, month, year)` key, where an
/// absent category is itself a distinguishable key value: the single
/// "overall" budget for that month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Budget {
    pub id: i64,

    /// Budgeted amount in cents (> 0).
    pub amount_cents: i64,

    /// Calendar month, 1-12.
    pub month: u32,

    pub year: i32,

    /// Budgeted category; absent = overall budget for the month.
    /// Deleting a category deletes its budgets (CASCADE).
    pub category_id: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Returns the budgeted amount as a Money type.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// True for the category-less "overall" budget.
    #[inline]
    pub fn is_overall(&self) -> bool {
        self.category_id.is_none()
    }
}

/// Input for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBudget {
    /// Amount in cents (> 0).
    pub amount_cents: i64,
    pub month: u32,
    pub year: i32,
    /// Absent = overall budget for the month.
    pub category_id: Option<i64>,
}

/// Partial update for a budget. Only the amount is mutable; changing the
/// `(category, month, year)` key is a delete + create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BudgetUpdate {
    pub amount_cents: Option<i64>,
}

// =============================================================================
// Report Types
// =============================================================================

/// An inclusive calendar-date range. Both bounds compare on the date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }
}

/// One row of a category breakdown: a category and its spend over a range.
///
/// Breakdowns carry one entry per existing category, including zero totals,
/// and are computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub total_cents: i64,
}

impl CategoryTotal {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One bucket of a monthly trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyTotal {
    pub month: u32,
    pub year: i32,
    pub total_cents: i64,
}

impl MonthlyTotal {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Budget utilization for one `(category | overall, month, year)` lookup.
///
/// ## Zero-Amount Budgets
/// A budget of exactly zero cannot divide spend, so utilization is defined
/// explicitly: 100% when any spend exists, else 0%. `exceeded` is true
/// whenever spend is strictly greater than the budget amount, so zero spend
/// against a zero budget is NOT exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BudgetUtilization {
    /// The matching budget amount in cents; `None` when no budget exists
    /// for the key (utilization is then 0% and not exceeded).
    pub budget_cents: Option<i64>,

    /// Spend over the full calendar month, in cents.
    pub spent_cents: i64,

    /// Spend as a percentage of the budget (150.0 = 150%). Display only -
    /// all comparisons use the exact cent values.
    pub percent: f64,

    /// True when spend strictly exceeds the budget amount.
    pub exceeded: bool,
}

impl BudgetUtilization {
    /// Returns the budget amount as Money, if a budget exists.
    #[inline]
    pub fn budget(&self) -> Option<Money> {
        self.budget_cents.map(Money::from_cents)
    }

    /// Returns the spend as Money.
    #[inline]
    pub fn spent(&self) -> Money {
        Money::from_cents(self.spent_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
