//! Day-bucketed document queries.
//!
//! # Responsibility
//! - Answer "which documents were created / last modified on day D".
//!
//! # Invariants
//! - Queries are pure: no cached state survives between calls.
//! - Day buckets use the local calendar, never UTC, unless a zone is passed
//!   explicitly.

pub mod day_index;
