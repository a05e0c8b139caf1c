//! # Calendar Module
//!
//! Month-boundary arithmetic for aggregation windows.
//!
//! All month math respects the real calendar: February has 29 days in leap
//! years, and a trailing-month walk crosses year boundaries correctly. Never
//! approximate a month as a fixed day count.

use chrono::{Datelike, NaiveDate};

/// Returns the last day number of the given month (28-31), honoring leap
/// years.
///
/// ## Example
/// ```rust
/// use outlay_core::calendar::last_day_of_month;
///
/// assert_eq!(last_day_of_month(2024, 2), Some(29)); // leap year
/// assert_eq!(last_day_of_month(2023, 2), Some(28));
/// assert_eq!(last_day_of_month(2024, 4), Some(30));
/// assert_eq!(last_day_of_month(2024, 13), None);
/// ```
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    // Validate (year, month) by constructing the first day
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(first_of_next.pred_opt()?.day())
}

/// Returns the inclusive first/last days of the given calendar month.
///
/// `None` for an invalid month or out-of-range year.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, last_day_of_month(year, month)?)?;
    Some((first, last))
}

/// Walks `count` months backwards from `(year, month)` inclusive and returns
/// them in chronological ascending order.
///
/// `count <= 0` yields an empty sequence. The anchor month is always the
/// final element.
///
/// ## Example
/// ```rust
/// use outlay_core::calendar::trailing_months;
///
/// // Three months ending at March 2024
/// assert_eq!(
///     trailing_months(2024, 3, 3),
///     vec![(2024, 1), (2024, 2), (2024, 3)]
/// );
///
/// // Crossing a year boundary
/// assert_eq!(
///     trailing_months(2024, 1, 2),
///     vec![(2023, 12), (2024, 1)]
/// );
/// ```
pub fn trailing_months(year: i32, month: u32, count: i32) -> Vec<(i32, u32)> {
    if count <= 0 || !(1..=12).contains(&month) {
        return Vec::new();
    }

    let mut months = Vec::with_capacity(count as usize);
    let (mut y, mut m) = (year, month);
    for _ in 0..count {
        months.push((y, m));
        if m == 1 {
            y -= 1;
            m = 12;
        } else {
            m -= 1;
        }
    }
    months.reverse();
    months
}

// =============================================================================
// Unit Tests
// =============================================================================
