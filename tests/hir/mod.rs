//! HIR layer tests
//!
//! Overlay merge of ordered fragments into one graph:
//! - Property version chains and delete side tables
//! - Scope-aware lookup around delete directives
//! - Label registry, phandles and merge diagnostics
//! - Specifier groups (nexus), `reg` and interrupts
//! - Bus-aware binding types

mod tests_merge;
mod tests_nexus;
mod tests_scope;
mod tests_types;
