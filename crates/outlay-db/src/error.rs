//! # Store Error Types
//!
//! Error taxonomy for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Hosting application ← Maps to user-facing messages                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Semantics
//! `Storage` is the only kind appropriate for caller-level retry (the medium
//! failed, the input was fine). Every other variant is permanent for the
//! given input and must be corrected before retrying.

use thiserror::Error;

use outlay_core::ValidationError;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input validation failed. Detected before any write.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Uniqueness violation on a category/trip name or a budget key.
    ///
    /// ## When This Occurs
    /// - Creating a category or trip whose name already exists (exact match)
    /// - Creating a budget whose `(category, month, year)` key already exists
    #[error("duplicate {entity}: '{name}' already exists")]
    DuplicateName { entity: &'static str, name: String },

    /// Operation on a missing identity.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Attempt to delete or alter the protected default category.
    #[error("protected entity: {reason}")]
    ProtectedEntity { reason: String },

    /// Schema version inconsistency.
    ///
    /// ## When This Occurs
    /// - Replaying an already-applied migration
    /// - A gap in the migration chain
    /// - The stored version is newer than this binary knows
    #[error("migration failed: {0}")]
    Migration(String),

    /// Underlying I/O or durability failure. Fatal for the operation, not
    /// retried by the store; surfaced to the caller.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    /// Creates a DuplicateName error.
    pub fn duplicate(entity: &'static str, name: impl Into<String>) -> Self {
        StoreError::DuplicateName {
            entity,
            name: name.into(),
        }
    }

    /// Creates a ProtectedEntity error.
    pub fn protected(reason: impl Into<String>) -> Self {
        StoreError::ProtectedEntity {
            reason: reason.into(),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx UNIQUE constraint violation → StoreError::DuplicateName
/// Everything else                  → StoreError::Storage
/// ```
///
/// Uniqueness is normally caught by the repositories' own pre-checks; this
/// mapping is the backstop for races the check cannot see.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let key = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::DuplicateName {
                        entity: "record",
                        name: key,
                    }
                } else {
                    StoreError::Storage(msg.to_string())
                }
            }
            _ => StoreError::Storage(err.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::duplicate("category", "Food");
        assert_eq!(err.to_string(), "duplicate category: 'Food' already exists");

        let err = StoreError::not_found("trip", 42);
        assert_eq!(err.to_string(), "trip not found: 42");
    }

    #[test]
    fn test_validation_converts_to_store_error() {
        let validation = ValidationError::Required {
            field: "name".to_string(),
        };
        let err: StoreError = validation.into();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
