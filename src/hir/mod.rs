//! High-level IR (HIR) - the merged runtime graph.
//!
//! This module turns ordered source fragments into one immutable [`Graph`]
//! per compilation unit and answers read-only queries over it.
//!
//! ## Key Types
//!
//! - [`GraphBuilder`] - Two-pass overlay merge (labels, then fragments)
//! - [`Graph`] - Arena of nodes, properties and delete directives
//! - [`NodeId`], [`PropertyId`], [`DirectiveId`] - Arena indices
//! - [`OverlayIssue`] - Non-fatal merge diagnostics
//! - [`BindingProvider`] / [`ConstEvaluator`] - External collaborators
//!
//! ## Layers
//!
//! ```text
//! SourceFragment[]          ← INPUT: parsed fragments in processing order
//!     │
//!     ▼
//! declare_labels            ← label → path registry (pass 1)
//!     │
//!     ▼
//! merge_fragment            ← version chains, delete side tables (pass 2)
//!     │
//!     ▼
//! Graph                     ← immutable snapshot
//!     │
//!     ▼
//! resolved_type / nexus     ← lazy, once per snapshot
//! ```

mod builder;
mod diagnostics;
mod error;
mod eval;
mod graph;
mod ids;
mod labels;
mod locate;
mod nexus;
mod query;
mod types;

pub use builder::{BuildOptions, GraphBuilder};
pub use diagnostics::{DiagnosticTag, IssueCollector, IssueKind, OverlayIssue, Severity};
pub use error::BuildError;
pub use eval::{ConstEvaluator, FunctionMacro, MacroTable};
pub use graph::{
    DeleteDirective, DeleteKind, DeleteRecord, DeletedEntity, Definition, DefinitionKind, Graph,
    LabelOccurrence, NodeData, PropertyData, SourceOrder,
};
pub use ids::{DirectiveId, NodeId, PropertyId};
pub use labels::{Binding, LabelEntry, LabelRegistry};
pub use locate::AstHit;
pub use nexus::{NexusMapping, RegBlock};
pub use types::{
    BindingProvider, EnumValue, NoBindings, NodeType, PropertyKind, PropertySpec, StaticBindings,
    names_property_for, specifier_space_for,
};
