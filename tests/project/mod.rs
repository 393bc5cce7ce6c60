//! Project layer tests
//!
//! Context hosts: debounced rebuilds, cancellation of superseded
//! rebuilds, waiting for a stable graph, and workspace isolation.

mod tests_context;
