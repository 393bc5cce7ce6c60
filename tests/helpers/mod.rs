//! Shared fixtures and helpers for integration tests.

pub mod fixtures;
pub mod graph_helpers;
