//! # Repository Implementations
//!
//! One repository per entity type, each exposing create/read/update/delete
//! plus the entity-specific reads the presentation layer needs.
//!
//! ## Mutation Protocol
//! Every mutating method follows the same protocol:
//! ```text
//! validate input            (before any write - no partial writes)
//!    │
//!    ▼
//! acquire write gate        (single logical writer)
//!    │
//!    ▼
//! BEGIN .. integrity checks, row changes, cascades .. COMMIT
//!    │
//!    ▼
//! publish change event      (commit order = delivery order)
//! ```
//!
//! Deletion policies (SET_DEFAULT / CASCADE / SET_NULL) run inside the
//! delete's own transaction, so no reader ever observes a dependent row
//! referencing a missing parent.

pub mod budget;
pub mod category;
pub mod expense;
pub mod trip;
