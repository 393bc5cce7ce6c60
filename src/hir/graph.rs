//! The merged runtime graph.
//!
//! One [`Graph`] is the result of a single builder pass over every fragment
//! of a compilation unit. It is immutable once published; the only interior
//! mutability is the once-only caches for derived data (resolved types,
//! specifier groups), which are pure functions of the snapshot.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::base::{FileId, Location, Name, Position, Span};
use crate::syntax::{NodeName, Value};

use super::diagnostics::OverlayIssue;
use super::eval::ConstEvaluator;
use super::ids::{DirectiveId, NodeId, PropertyId};
use super::labels::LabelRegistry;
use super::nexus::NexusMapping;
use super::types::{BindingProvider, NodeType};

/// Position of a fragment element in processing order: fragment index first,
/// then the position inside the fragment's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceOrder {
    pub fragment: u32,
    pub position: Position,
}

impl SourceOrder {
    pub fn new(fragment: usize, position: Position) -> Self {
        Self {
            fragment: fragment as u32,
            position,
        }
    }
}

/// Which syntax contributed to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// `/ { ... };`
    Root,
    /// `name@addr { ... };` nested in a body
    Child,
    /// `&label { ... };` or `&{/path} { ... };`
    Reference,
}

/// One fragment that contributed to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub location: Location,
    /// Span of the node name (or of the `&label` target for references)
    pub name_location: Location,
    pub order: SourceOrder,
}

/// A label occurrence attached to a contributing fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelOccurrence {
    pub name: Name,
    pub location: Location,
}

/// Something a delete directive removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletedEntity {
    Node(NodeId),
    Property(PropertyId),
}

/// Association between a removed entity and the directive responsible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeleteRecord {
    pub entity: DeletedEntity,
    pub directive: DirectiveId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteKind {
    Node,
    Property,
}

/// A `/delete-node/` or `/delete-property/` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDirective {
    pub kind: DeleteKind,
    /// Target as written (`clock-frequency`, `uart@1000`, `&uart1`)
    pub target: String,
    pub location: Location,
    pub target_location: Location,
    pub order: SourceOrder,
    /// Node whose body holds the directive; `None` at top level.
    pub scope: Option<NodeId>,
    /// What it removed; `None` when the target did not exist.
    pub removed: Option<DeletedEntity>,
}

/// One logical device-tree node after overlay merge.
#[derive(Debug)]
pub struct NodeData {
    pub name: NodeName,
    pub parent: Option<NodeId>,
    /// Live children in insertion order.
    pub children: Vec<NodeId>,
    /// Live properties in insertion order.
    pub properties: IndexMap<Name, PropertyId>,
    pub deleted_children: Vec<DeleteRecord>,
    pub deleted_properties: Vec<DeleteRecord>,
    /// Root and child fragments that contributed to this node.
    pub definitions: Vec<Definition>,
    /// Reference-node fragments that targeted this node.
    pub referenced_by: Vec<Definition>,
    pub labels: Vec<LabelOccurrence>,
    /// Every property version ever declared on this node, live or not.
    pub history: Vec<PropertyId>,
    /// Directives declared inside this node's bodies.
    pub directives: Vec<DirectiveId>,
    pub deleted_by: Option<DirectiveId>,
    pub phandle: Option<u64>,
    pub(crate) resolved_type: OnceLock<Option<Arc<NodeType>>>,
}

impl NodeData {
    pub(crate) fn new(name: NodeName, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            properties: IndexMap::new(),
            deleted_children: Vec::new(),
            deleted_properties: Vec::new(),
            definitions: Vec::new(),
            referenced_by: Vec::new(),
            labels: Vec::new(),
            history: Vec::new(),
            directives: Vec::new(),
            deleted_by: None,
            phandle: None,
            resolved_type: OnceLock::new(),
        }
    }

    /// `name` or `name@addr` in hex.
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_by.is_some()
    }

    /// Definitions and references together, in processing order.
    pub fn contributions(&self) -> Vec<&Definition> {
        let mut all: Vec<&Definition> = self
            .definitions
            .iter()
            .chain(self.referenced_by.iter())
            .collect();
        all.sort_by_key(|d| d.order);
        all
    }
}

/// One named value attached to a node.
#[derive(Debug)]
pub struct PropertyData {
    pub name: Name,
    pub owner: NodeId,
    pub values: Vec<Value>,
    pub labels: Vec<LabelOccurrence>,
    pub location: Location,
    pub name_location: Location,
    pub order: SourceOrder,
    /// Older version this one superseded.
    pub replaces: Option<PropertyId>,
    /// Newer version that superseded this one.
    pub replaced_by: Option<PropertyId>,
    pub deleted_by: Option<DirectiveId>,
    pub(crate) nexus: OnceLock<Vec<NexusMapping>>,
}

impl PropertyData {
    /// True when no later declaration replaced it and no directive removed it.
    pub fn is_live(&self) -> bool {
        self.replaced_by.is_none() && self.deleted_by.is_none()
    }

    /// Boolean properties carry no value (`ranges;`).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The merged graph of one compilation unit.
pub struct Graph {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) properties: Vec<PropertyData>,
    pub(crate) directives: Vec<DeleteDirective>,
    pub(crate) root: NodeId,
    /// Placeholder nodes substituted for unresolved references.
    pub(crate) orphans: Vec<NodeId>,
    pub(crate) labels: LabelRegistry,
    pub(crate) issues: Vec<OverlayIssue>,
    /// File and span of each fragment, indexed by processing order.
    pub(crate) fragment_spans: Vec<(FileId, Span)>,
    pub(crate) bindings: Arc<dyn BindingProvider>,
    pub(crate) evaluator: Arc<dyn ConstEvaluator>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("properties", &self.properties.len())
            .field("directives", &self.directives.len())
            .field("issues", &self.issues.len())
            .finish()
    }
}

impl Graph {
    pub(crate) fn empty(
        bindings: Arc<dyn BindingProvider>,
        evaluator: Arc<dyn ConstEvaluator>,
    ) -> Self {
        Self {
            nodes: vec![NodeData::new(NodeName::new("", None), None)],
            properties: Vec::new(),
            directives: Vec::new(),
            root: NodeId::new(0),
            orphans: Vec::new(),
            labels: LabelRegistry::new(),
            issues: Vec::new(),
            fragment_spans: Vec::new(),
            bindings,
            evaluator,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyData {
        &self.properties[id.index()]
    }

    pub fn directive(&self, id: DirectiveId) -> &DeleteDirective {
        &self.directives[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn issues(&self) -> &[OverlayIssue] {
        &self.issues
    }

    pub fn issues_for_file(&self, file: FileId) -> impl Iterator<Item = &OverlayIssue> {
        self.issues.iter().filter(move |i| i.location.file == file)
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn orphans(&self) -> &[NodeId] {
        &self.orphans
    }

    pub fn evaluator(&self) -> &dyn ConstEvaluator {
        self.evaluator.as_ref()
    }

    pub fn bindings(&self) -> &dyn BindingProvider {
        self.bindings.as_ref()
    }

    pub fn directives(&self) -> impl Iterator<Item = (DirectiveId, &DeleteDirective)> {
        self.directives
            .iter()
            .enumerate()
            .map(|(i, d)| (DirectiveId::new(i), d))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> &mut PropertyData {
        &mut self.properties[id.index()]
    }

    pub(crate) fn alloc_node(&mut self, name: NodeName, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData::new(name, parent));
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    pub(crate) fn alloc_property(&mut self, data: PropertyData) -> PropertyId {
        let id = PropertyId::new(self.properties.len());
        self.nodes[data.owner.index()].history.push(id);
        self.properties.push(data);
        id
    }

    pub(crate) fn alloc_directive(&mut self, directive: DeleteDirective) -> DirectiveId {
        let id = DirectiveId::new(self.directives.len());
        if let Some(scope) = directive.scope {
            self.nodes[scope.index()].directives.push(id);
        }
        self.directives.push(directive);
        id
    }
}
