//! Graph construction and assertion helpers.

use std::sync::Arc;

use dtsa::hir::{Graph, GraphBuilder, IssueKind, MacroTable, NodeId};
use dtsa::syntax::SourceFragment;

use crate::helpers::fixtures::BINDINGS;

/// Build a graph with the shared test bindings.
pub fn build(fragments: &[SourceFragment]) -> Graph {
    GraphBuilder::new(Arc::new(BINDINGS.clone()))
        .build(fragments)
        .expect("build should succeed")
}

/// Build with the shared bindings and `defines` as the cell evaluator.
pub fn build_with_defines(fragments: &[SourceFragment], defines: MacroTable) -> Graph {
    GraphBuilder::new(Arc::new(BINDINGS.clone()))
        .with_evaluator(Arc::new(defines))
        .build(fragments)
        .expect("build should succeed")
}

/// Live node at `path`, panicking with the path when missing.
pub fn node(graph: &Graph, path: &str) -> NodeId {
    graph
        .get_node(path)
        .unwrap_or_else(|| panic!("no live node at {path}"))
}

/// Codes of all issues, in report order.
pub fn issue_codes(graph: &Graph) -> Vec<&'static str> {
    graph.issues().iter().map(|i| i.kind.code()).collect()
}

/// Issues of one kind.
pub fn issues_of(graph: &Graph, kind: IssueKind) -> usize {
    graph.issues().iter().filter(|i| i.kind == kind).count()
}
