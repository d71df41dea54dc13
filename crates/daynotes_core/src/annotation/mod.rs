//! Persistent path → color annotations.
//!
//! # Responsibility
//! - Own the durable `noteColors` record and its codec.
//! - Keep annotations attached to documents across rename/delete events.
//!
//! # Invariants
//! - Every successful mutation is durably written before the call returns.
//! - No-op mutations (absent path, unannotated rename) never write.
//! - Unknown sibling fields of the durable record survive every rewrite.

pub mod record;
pub mod store;
