//! Domain model for documents and their day-level projections.
//!
//! # Responsibility
//! - Define the read-only document shape the core receives from the vault.
//! - Keep timestamps in one unit (epoch milliseconds) across all modules.
//!
//! # Invariants
//! - A document is identified by its current `path`; identity does not survive
//!   a rename from the model's point of view.
//! - The core never mutates documents.

pub mod document;
