//! Cursor position → graph entity, and order-relative scope.

use crate::base::{FileId, Location, Position};

use super::graph::{DeletedEntity, Graph, SourceOrder};
use super::ids::{DirectiveId, NodeId, PropertyId};

/// Entity owning a cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstHit {
    Node(NodeId),
    Property(PropertyId),
    Directive(DirectiveId),
}

impl Graph {
    /// Processing order of a cursor position.
    ///
    /// Positions inside a fragment get that fragment's index. Positions
    /// between fragments belong to the last fragment of the file that starts
    /// before them.
    pub fn order_of(&self, file: FileId, position: Position) -> SourceOrder {
        let mut fragment = 0;
        for (index, (frag_file, span)) in self.fragment_spans.iter().enumerate() {
            if *frag_file != file {
                continue;
            }
            if span.contains(position) {
                return SourceOrder::new(index, position);
            }
            if span.start <= position {
                fragment = index;
            }
        }
        SourceOrder::new(fragment, position)
    }

    /// Predicate for [`get_child_from_scope`](Self::get_child_from_scope):
    /// a directive is in scope when it precedes the position.
    pub fn scope_at(&self, file: FileId, position: Position) -> impl Fn(DirectiveId) -> bool + '_ {
        let order = self.order_of(file, position);
        move |directive| self.directive(directive).order < order
    }

    /// Deepest node, property or delete directive whose span contains the
    /// position. Deleted entities and placeholder nodes are included.
    pub fn deepest_ast_node_at(&self, file: FileId, position: Position) -> Option<AstHit> {
        let mut best: Option<(Location, AstHit)> = None;
        let mut consider = |location: Location, hit: AstHit| {
            if !location.contains(file, position) {
                return;
            }
            match &best {
                Some((current, _)) if !current.span.encloses(&location.span) => {}
                _ => best = Some((location, hit)),
            }
        };

        for (index, node) in self.nodes.iter().enumerate() {
            let hit = AstHit::Node(NodeId::new(index));
            for definition in node.definitions.iter().chain(node.referenced_by.iter()) {
                consider(definition.location, hit);
                consider(definition.name_location, hit);
            }
        }
        for (index, property) in self.properties.iter().enumerate() {
            consider(property.location, AstHit::Property(PropertyId::new(index)));
        }
        for (index, directive) in self.directives.iter().enumerate() {
            consider(directive.location, AstHit::Directive(DirectiveId::new(index)));
        }

        best.map(|(_, hit)| hit)
    }

    /// Node a hit belongs to (the owner for properties, the scope for
    /// directives, the removed node for top-level deletes).
    pub fn owning_node(&self, hit: AstHit) -> Option<NodeId> {
        match hit {
            AstHit::Node(node) => Some(node),
            AstHit::Property(property) => Some(self.property(property).owner),
            AstHit::Directive(directive) => {
                let directive = self.directive(directive);
                directive.scope.or(match directive.removed {
                    Some(DeletedEntity::Node(node)) => self.parent(node),
                    _ => None,
                })
            }
        }
    }
}
