//! # dtsa-base
//!
//! Core library for devicetree editor tooling: overlay merge of parsed
//! source fragments into one runtime graph, read-only queries over it, and
//! resolution of Zephyr `DT_*` accessor macros against it.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → hover, go-to-definition, Analysis snapshot facade
//!   ↓
//! project   → per-context host: debounced rebuild, graph swap, parse cache
//!   ↓
//! macros    → macro call trees, preprocessor boundary, resolution engine
//!   ↓
//! hir       → graph builder, graph, queries, labels, bindings, nexus
//!   ↓
//! syntax    → value kinds, fragment boundary types, C token/expression parsing
//!   ↓
//! base      → primitives (FileId, Position/Span, Name, identifier casing)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → hir → macros → project → ide)
// ============================================================================

/// Foundation types: FileId, Position/Span/Location, Name, identifier casing
pub mod base;

/// Syntax: value-kind model, parsed-fragment boundary types, constant expressions
pub mod syntax;

/// High-level IR: merged runtime graph and its query surface
pub mod hir;

/// Macro Resolution Engine for `DT_*` accessor expressions
pub mod macros;

/// Project management: context hosts, workspace, configuration
pub mod project;

/// IDE features: hover, goto-definition
pub mod ide;

// Re-export foundation types
pub use base::{FileId, Location, Name, Position, Span, TextRange, TextSize};

// Re-export the types most hosts need
pub use hir::{BuildError, Graph, GraphBuilder, NodeId, OverlayIssue, PropertyId};
pub use macros::{MacroEngine, MacroEnv, PreprocessorEnv, Resolved};
pub use project::{ContextHost, HostConfig, Workspace};
