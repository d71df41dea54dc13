//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate vault, annotation and index calls into use-case APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod daily_service;
