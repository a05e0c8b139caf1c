//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Summing a year of expenses in a different order can change the total  │
//! │  by a few cents - unacceptable for a ledger.                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "12.50" ⇄ 1250 cents, exactly, every time                           │
//! │    Integer addition is associative: summation order never matters      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use outlay_core::money::Money;
//!
//! // Create from cents (preferred) or parse an exact decimal string
//! let amount = Money::from_cents(1250); // 12.50
//! let parsed: Money = "12.50".parse().unwrap();
//! assert_eq!(amount, parsed);
//!
//! // Formatting is the exact inverse of parsing
//! assert_eq!(amount.to_string(), "12.50");
//!
//! // NEVER do this:
//! // let bad = Money::from_float(12.50); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values (spend vs budget)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency-agnostic**: Two fractional digits, no currency symbol
/// - **String serde**: Crosses the API boundary as an exact decimal string
///   ("12.50"), never as binary floating point
///
/// ## Where Money is Used
/// ```text
/// Expense.amount ──► range totals ──► category breakdown ──► trend buckets
/// Budget.amount  ──► utilization (spend / budget)
/// EVERY monetary value in the system flows through this type
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use outlay_core::money::Money;
    ///
    /// let amount = Money::from_cents(1250); // Represents 12.50
    /// assert_eq!(amount.cents(), 1250);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The database, calculations, and API all use cents.
    /// Only the UI converts to a localized display format.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use outlay_core::money::Money;
    ///
    /// let amount = Money::from_major_minor(12, 50); // 12.50
    /// assert_eq!(amount.cents(), 1250);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99, absolute value).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    ///
    /// ## Example
    /// ```rust
    /// use outlay_core::money::Money;
    ///
    /// let zero = Money::zero();
    /// assert!(zero.is_zero());
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }
}

// =============================================================================
// Parsing & Formatting
// =============================================================================

/// Display implementation formats the canonical exact decimal string.
///
/// Always two fractional digits, no currency symbol, no grouping:
/// `1250` cents → `"12.50"`, `-307` cents → `"-3.07"`.
///
/// This is the exact inverse of [`FromStr`]: for any Money value `m`,
/// `m.to_string().parse::<Money>()` yields a value equal to `m` that formats
/// identically.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Parses an exact decimal string into Money.
///
/// ## Accepted Grammar
/// - optional sign (`-` or `+`)
/// - one or more integer digits
/// - optionally a `.` followed by one or two fraction digits
///
/// ## Examples
/// ```rust
/// use outlay_core::money::Money;
///
/// assert_eq!("12.50".parse::<Money>().unwrap().cents(), 1250);
/// assert_eq!("12.5".parse::<Money>().unwrap().cents(), 1250);
/// assert_eq!("12".parse::<Money>().unwrap().cents(), 1200);
/// assert_eq!("-3.07".parse::<Money>().unwrap().cents(), -307);
///
/// assert!("12.505".parse::<Money>().is_err()); // too many fraction digits
/// assert!("12,50".parse::<Money>().is_err());  // wrong separator
/// assert!("".parse::<Money>().is_err());
/// ```
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((int, frac)) => (int, Some(frac)),
            None => (rest, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits"));
        }

        let major: i64 = int_part
            .parse()
            .map_err(|_| invalid("integer part out of range"))?;

        let minor: i64 = match frac_part {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("expected at most two fraction digits"));
                }
                let digits: i64 = frac.parse().map_err(|_| invalid("bad fraction"))?;
                // "5" means 50 cents, "05" means 5 cents
                if frac.len() == 1 {
                    digits * 10
                } else {
                    digits
                }
            }
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount out of range"))?;

        Ok(if negative { Money(-cents) } else { Money(cents) })
    }
}

// =============================================================================
// Serde: Exact Decimal Strings
// =============================================================================

/// Serializes as the canonical decimal string ("12.50").
///
/// Money never crosses a serialization boundary as a float.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Deserializes from an exact decimal string.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Iterator summation. Exact, so summation order never affects the result.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1250);
        assert_eq!(money.cents(), 1250);
        assert_eq!(money.major(), 12);
        assert_eq!(money.minor(), 50);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(12, 50).cents(), 1250);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("12.50".parse::<Money>().unwrap().cents(), 1250);
        assert_eq!("12.5".parse::<Money>().unwrap().cents(), 1250);
        assert_eq!("12".parse::<Money>().unwrap().cents(), 1200);
        assert_eq!("0.07".parse::<Money>().unwrap().cents(), 7);
        assert_eq!("-3.07".parse::<Money>().unwrap().cents(), -307);
        assert_eq!("+1.00".parse::<Money>().unwrap().cents(), 100);
        assert_eq!(" 2.25 ".parse::<Money>().unwrap().cents(), 225);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
        assert!("12.".parse::<Money>().is_err());
        assert!("12.505".parse::<Money>().is_err());
        assert!("12,50".parse::<Money>().is_err());
        assert!("$12.50".parse::<Money>().is_err());
        assert!("1e3".parse::<Money>().is_err());
        assert!("--1".parse::<Money>().is_err());
    }

    /// Critical property: format then parse is the identity for every value.
    #[test]
    fn test_round_trip() {
        for cents in [0, 1, 7, 99, 100, 1250, 99999, -1, -50, -1250, i64::MAX / 100] {
            let original = Money::from_cents(cents);
            let reparsed: Money = original.to_string().parse().unwrap();
            assert_eq!(reparsed, original);
            assert_eq!(reparsed.to_string(), original.to_string());
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1500);
        c -= b;
        assert_eq!(c.cents(), 1000);
    }

    /// Summation is associative because the representation is exact.
    #[test]
    fn test_sum_order_independent() {
        let values = [1, 3, 7, 33, 99, 250, 1250, 9999]
            .map(Money::from_cents)
            .to_vec();
        let forward: Money = values.iter().sum();
        let backward: Money = values.iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.cents(), 11642);
    }

    #[test]
    fn test_serde_exact_decimal_string() {
        let amount = Money::from_cents(1250);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"12.50\"");

        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);

        // Floats are never accepted
        assert!(serde_json::from_str::<Money>("12.50").is_err());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs().cents(), 100);
    }
}
