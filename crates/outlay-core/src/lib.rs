//! # outlay-core: Pure Domain Logic for the Outlay Expense Ledger
//!
//! This crate is the **heart** of Outlay. It contains the domain model and
//! all pure logic with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Outlay Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation / Capture Layers                   │   │
//! │  │    Expense UI ──► Budget UI ──► Trend Charts ──► Receipt OCR    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    outlay-db (Storage Layer)                    │   │
//! │  │       SQLite repositories, reports, migrations, live queries    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ outlay-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ calendar  │  │ validation│  │   │
//! │  │   │  Expense  │  │   Money   │  │  month    │  │   rules   │  │   │
//! │  │   │  Category │  │  parsing  │  │  bounds   │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Trip, Expense, Budget, reports)
//! - [`money`] - Money type with exact integer arithmetic (no floating point!)
//! - [`calendar`] - Month-boundary and trailing-month arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use outlay_core::money::Money;
//!
//! // Parse an exact decimal string (never from floats!)
//! let amount: Money = "12.50".parse().unwrap();
//! assert_eq!(amount.cents(), 1250);
//!
//! // Summation order never matters - integer arithmetic is exact
//! let total = amount + Money::from_cents(99);
//! assert_eq!(total.to_string(), "13.49");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use outlay_core::Money` instead of
// `use outlay_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reserved identity of the default category ("Uncategorized").
///
/// ## Why a constant?
/// The default category is a well-known row seeded at first run with a fixed
/// id. Deletion policies reassign orphaned expenses to this id, and the store
/// refuses to delete the row itself. Checking an explicit reserved id is
/// robust against insertion order, unlike "first row wins" schemes.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

/// Display name of the default category.
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// Maximum length of a category or trip name.
///
/// ## Business Reason
/// Keeps names usable in list UIs and prevents accidental paste-bombs.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of free-form text fields (vendor, location, notes).
pub const MAX_TEXT_LEN: usize = 500;
