//! Go-to-definition implementation.

use crate::base::{FileId, Location, Position};
use crate::hir::{AstHit, DeletedEntity, Graph, NodeId, PropertyId};
use crate::syntax::flatten;

/// Result of a go-to-definition request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GotoResult {
    /// The targets to jump to, in processing order.
    pub targets: Vec<GotoTarget>,
}

impl GotoResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A target location for go-to-definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub location: Location,
    /// Path of the node the target belongs to.
    pub path: String,
}

/// Definitions of the entity under the cursor.
///
/// - node name: every fragment that contributed to the node
/// - property with reference values: the referenced nodes
/// - other properties: every declared version, oldest first
/// - delete directive: what it removed
pub fn goto_definition(graph: &Graph, file: FileId, position: Position) -> GotoResult {
    let Some(hit) = graph.deepest_ast_node_at(file, position) else {
        return GotoResult::empty();
    };
    let targets = match hit {
        AstHit::Node(node) => node_targets(graph, node),
        AstHit::Property(property) => {
            let referenced: Vec<NodeId> = flatten(&graph.property(property).values)
                .into_iter()
                .filter(|v| v.is_reference())
                .filter_map(|v| graph.resolve_reference(v))
                .collect();
            if referenced.is_empty() {
                property_targets(graph, property)
            } else {
                referenced
                    .into_iter()
                    .flat_map(|node| node_targets(graph, node))
                    .collect()
            }
        }
        AstHit::Directive(directive) => match graph.directive(directive).removed {
            Some(DeletedEntity::Node(node)) => node_targets(graph, node),
            Some(DeletedEntity::Property(property)) => property_targets(graph, property),
            None => Vec::new(),
        },
    };
    GotoResult { targets }
}

fn node_targets(graph: &Graph, node: NodeId) -> Vec<GotoTarget> {
    let path = graph.path_of(node);
    graph
        .node(node)
        .contributions()
        .into_iter()
        .map(|definition| GotoTarget {
            location: definition.name_location,
            path: path.clone(),
        })
        .collect()
}

fn property_targets(graph: &Graph, property: PropertyId) -> Vec<GotoTarget> {
    let path = graph.path_of(graph.property(property).owner);
    graph
        .version_chain(property)
        .into_iter()
        .map(|version| GotoTarget {
            location: graph.property(version).name_location,
            path: path.clone(),
        })
        .collect()
}
