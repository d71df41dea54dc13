//! Flutter-facing bindings for `daynotes_core`.

pub mod api;
