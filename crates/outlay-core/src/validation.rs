//! # Validation Module
//!
//! Input validation rules for the Outlay ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation layer                                           │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, called by the repositories                      │
//! │  ├── Checked BEFORE any write - a failure never leaves a partial row  │
//! │  └── Business rule validation                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_NAME_LEN, MAX_TEXT_LEN};

// =============================================================================
// String Validators
// =============================================================================

/// Validates a category or trip name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use outlay_core::validation::validate_name;
///
/// assert!(validate_name("name", "Food & Dining").is_ok());
/// assert!(validate_name("name", "").is_err());
/// assert!(validate_name("name", &"A".repeat(200)).is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a display color.
///
/// ## Rules
/// - Hex form `#RRGGBB`, exactly seven characters
pub fn validate_color(color: &str) -> ValidationResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            reason: "expected #RRGGBB".to_string(),
        });
    }

    Ok(())
}

/// Validates an expense vendor.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most [`MAX_TEXT_LEN`] characters
pub fn validate_vendor(vendor: &str) -> ValidationResult<()> {
    let vendor = vendor.trim();

    if vendor.is_empty() {
        return Err(ValidationError::Required {
            field: "vendor".to_string(),
        });
    }

    if vendor.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: "vendor".to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates optional free-form text (location, notes, receipt path).
///
/// Empty is allowed; only the length is bounded.
pub fn validate_text(field: &str, text: &str) -> ValidationResult<()> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an expense amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (comped meals, refunded purchases)
///
/// ## Example
/// ```rust
/// use outlay_core::validation::validate_expense_amount;
///
/// assert!(validate_expense_amount(1250).is_ok());
/// assert!(validate_expense_amount(0).is_ok());
/// assert!(validate_expense_amount(-100).is_err());
/// ```
pub fn validate_expense_amount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a budget amount in cents.
///
/// ## Rules
/// - Must be strictly positive (> 0)
/// - A zero budget cannot be created; zero-amount rows reachable through
///   schema history still get a defined utilization (see reports)
pub fn validate_budget_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a calendar month number.
///
/// ## Rules
/// - Must be in [1, 12]
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
