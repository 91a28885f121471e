//! Local post history used for per-slot dedup and the `history` command.
//!
//! The store is a single JSON document (`{"posts": [...]}`) rewritten
//! atomically on every append and pruned to a rolling 30-day window.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{PostRecord, STORED_TEXT_CHARS};
pub use store::{PostStore, RETENTION_DAYS};
