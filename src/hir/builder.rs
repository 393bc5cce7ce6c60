//! Runtime graph builder.
//!
//! Two passes over the ordered fragments:
//!
//! 1. Every label declaration is registered with the path its fragment
//!    merges into, so `&label` can be resolved before the label's own
//!    fragment has been merged.
//! 2. Fragments are merged one at a time into the arena. Property
//!    collisions extend the version chain, delete directives move entities
//!    into per-node side tables, and unresolved references merge into a
//!    placeholder node instead of aborting.
//!
//! A final walk derives phandle values. Everything else derived (types,
//! specifier groups) is computed lazily on the published snapshot.

use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};
use tokio_util::sync::CancellationToken;

use crate::base::{FileId, Location, Name, Span};
use crate::syntax::{
    BodyItem, ChildNodeFragment, DeleteNodeDirective, DeletePropertyDirective, DeleteTarget,
    FragmentKind, LabelDecl, NodeBody, NodeName, NodeRef, PropertyDecl, SourceFragment, Value,
    flatten,
};

use super::diagnostics::{IssueCollector, IssueKind};
use super::error::BuildError;
use super::eval::{ConstEvaluator, MacroTable};
use super::graph::{
    DeleteDirective, DeleteKind, DeleteRecord, DeletedEntity, Definition, DefinitionKind, Graph,
    LabelOccurrence, PropertyData, SourceOrder,
};
use super::ids::{DirectiveId, NodeId, PropertyId};
use super::labels::{Binding, LabelEntry};
use super::types::{BindingProvider, NoBindings};

/// Optional diagnostics the builder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Warn on every later holder of an already-used phandle value.
    pub report_duplicate_phandles: bool,
    /// Emit deprecated-tagged hints on the spans of deleted entities.
    pub report_deleted_entities: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            report_duplicate_phandles: true,
            report_deleted_entities: true,
        }
    }
}

/// Builds a [`Graph`] from ordered source fragments.
#[derive(Clone)]
pub struct GraphBuilder {
    bindings: Arc<dyn BindingProvider>,
    evaluator: Arc<dyn ConstEvaluator>,
    options: BuildOptions,
    cancel: Option<CancellationToken>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(Arc::new(NoBindings))
    }
}

impl GraphBuilder {
    pub fn new(bindings: Arc<dyn BindingProvider>) -> Self {
        Self {
            bindings,
            evaluator: Arc::new(MacroTable::new()),
            options: BuildOptions::default(),
            cancel: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConstEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Check `cancel` before each fragment and bail out once it fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Merge `fragments` (already in processing order) into a fresh graph.
    pub fn build(&self, fragments: &[SourceFragment]) -> Result<Graph, BuildError> {
        let mut merge = Merge {
            graph: Graph::empty(self.bindings.clone(), self.evaluator.clone()),
            issues: IssueCollector::new(),
            options: self.options,
            fragment: 0,
            file: FileId::default(),
        };

        merge.declare_labels(fragments);

        let total = fragments.len();
        for (index, fragment) in fragments.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                tracing::debug!("[BUILD] cancelled after {index} of {total} fragments");
                return Err(BuildError::Cancelled {
                    processed: index,
                    total,
                });
            }
            merge.fragment = index;
            merge.file = fragment.file;
            merge
                .graph
                .fragment_spans
                .push((fragment.file, fragment.span()));
            merge.merge_fragment(fragment)?;
        }

        merge.assign_phandles();

        let Merge {
            mut graph, issues, ..
        } = merge;
        graph.issues = issues.issues().to_vec();

        tracing::debug!(
            "[BUILD] merged {} fragments: {} nodes, {} properties, {} directives, {} issues",
            total,
            graph.nodes.len(),
            graph.properties.len(),
            graph.directives.len(),
            graph.issues.len()
        );
        Ok(graph)
    }
}

/// Join a parent path and a child's full name.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() || parent == "/" {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

struct Merge {
    graph: Graph,
    issues: IssueCollector,
    options: BuildOptions,
    fragment: usize,
    file: FileId,
}

impl Merge {
    fn location(&self, span: Span) -> Location {
        Location::new(self.file, span)
    }

    fn order(&self, span: Span) -> SourceOrder {
        SourceOrder::new(self.fragment, span.start)
    }

    // ------------------------------------------------------------------------
    // Pass 1: labels
    // ------------------------------------------------------------------------

    fn declare_labels(&mut self, fragments: &[SourceFragment]) {
        for fragment in fragments {
            self.file = fragment.file;
            match &fragment.kind {
                FragmentKind::Root(root) => {
                    self.declare(&root.labels, Some("/".to_string()), false);
                    self.declare_body(&root.body, "/");
                }
                FragmentKind::Reference(reference) => {
                    let path = match &reference.target {
                        NodeRef::Label(label) => {
                            self.graph.labels.path_of(label).map(String::from)
                        }
                        NodeRef::Path(path) => Some(path.to_string()),
                    };
                    self.declare(&reference.labels, path.clone(), true);
                    if let Some(path) = path {
                        self.declare_body(&reference.body, &path);
                    }
                }
                FragmentKind::DeleteNode(_) => {}
            }
        }
    }

    fn declare_body(&mut self, body: &NodeBody, parent_path: &str) {
        for item in &body.items {
            if let BodyItem::Child(child) = item {
                let path = join_path(parent_path, &child.name.full_name());
                self.declare(&child.labels, Some(path.clone()), false);
                self.declare_body(&child.body, &path);
            }
        }
    }

    fn declare(&mut self, labels: &[LabelDecl], path: Option<String>, from_reference: bool) {
        for label in labels {
            let entry = LabelEntry {
                location: self.location(label.span),
                path: path.clone(),
                from_reference,
            };
            self.graph.labels.declare(label.name.clone(), entry);
        }
    }

    // ------------------------------------------------------------------------
    // Pass 2: merge
    // ------------------------------------------------------------------------

    fn merge_fragment(&mut self, fragment: &SourceFragment) -> Result<(), BuildError> {
        tracing::trace!(
            "[BUILD] merging fragment {} from {}",
            self.fragment,
            fragment.file
        );
        match &fragment.kind {
            FragmentKind::Root(root) => {
                let node = self.graph.root;
                let definition = Definition {
                    kind: DefinitionKind::Root,
                    location: self.location(root.span),
                    name_location: self.location(root.span),
                    order: self.order(root.span),
                };
                self.graph.node_mut(node).definitions.push(definition);
                self.attach_labels(node, &root.labels, false);
                self.merge_body(node, &root.body)
            }
            FragmentKind::Reference(reference) => {
                let node = match self.resolve_ref(&reference.target, true) {
                    Some(node) => node,
                    None => {
                        self.issues.report(
                            IssueKind::UnableToResolveChildNode,
                            self.location(reference.target_span),
                            format!("unable to resolve {}", reference.target),
                        );
                        let placeholder = self.graph.alloc_node(NodeName::new("", None), None);
                        self.graph.orphans.push(placeholder);
                        placeholder
                    }
                };
                let definition = Definition {
                    kind: DefinitionKind::Reference,
                    location: self.location(reference.span),
                    name_location: self.location(reference.target_span),
                    order: self.order(reference.span),
                };
                self.graph.node_mut(node).referenced_by.push(definition);
                self.attach_labels(node, &reference.labels, true);
                self.merge_body(node, &reference.body)
            }
            FragmentKind::DeleteNode(directive) => self.delete_node(None, directive),
        }
    }

    /// Resolve a reference-node target, creating missing path segments when
    /// `create` is set.
    fn resolve_ref(&mut self, target: &NodeRef, create: bool) -> Option<NodeId> {
        match target {
            NodeRef::Label(label) => {
                if let Some(node) = self.graph.labels.node_of(label) {
                    return self.graph.is_live(node).then_some(node);
                }
                let path = self.graph.labels.path_of(label)?.to_string();
                self.walk_path(&path, create)
            }
            NodeRef::Path(path) => self.walk_path(path, create),
        }
    }

    fn walk_path(&mut self, path: &str, create: bool) -> Option<NodeId> {
        if !path.starts_with('/') {
            return None;
        }
        let mut current = self.graph.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let wanted = NodeName::parse(segment);
            current = match self.graph.child_by_name(current, &wanted, false) {
                Some(child) => child,
                None if create => self.graph.alloc_node(wanted, Some(current)),
                None => return None,
            };
        }
        Some(current)
    }

    fn attach_labels(&mut self, node: NodeId, labels: &[LabelDecl], from_reference: bool) {
        for label in labels {
            let location = self.location(label.span);
            match self.graph.labels.bind(&label.name, node) {
                Binding::New => {}
                Binding::Same if from_reference => {}
                Binding::Same => self.issues.report(
                    IssueKind::LabelReassigned,
                    location,
                    format!("label '{}' is already assigned to this node", label.name),
                ),
                // Deleted nodes release their labels.
                Binding::Conflict(other) if !self.graph.is_live(other) => {
                    tracing::debug!(
                        "[BUILD] label '{}' moves from deleted {}",
                        label.name,
                        self.graph.path_of(other)
                    );
                    self.graph.labels.rebind(&label.name, node);
                }
                Binding::Conflict(other) => {
                    let other_path = self.graph.path_of(other);
                    self.issues.report(
                        IssueKind::LabelAlreadyInUse,
                        location,
                        format!("label '{}' is already in use by {other_path}", label.name),
                    );
                    continue;
                }
            }
            self.graph.node_mut(node).labels.push(LabelOccurrence {
                name: label.name.clone(),
                location,
            });
        }
    }

    fn merge_body(&mut self, node: NodeId, body: &NodeBody) -> Result<(), BuildError> {
        let mut seen_properties: FxHashSet<Name> = FxHashSet::default();
        let mut seen_children: FxHashSet<NodeName> = FxHashSet::default();

        for item in &body.items {
            match item {
                BodyItem::Property(decl) => {
                    if !seen_properties.insert(decl.name.clone()) {
                        self.issues.report(
                            IssueKind::DuplicatePropertyName,
                            self.location(decl.name_span),
                            format!("duplicate property name '{}'", decl.name),
                        );
                    }
                    self.merge_property(node, decl);
                }
                BodyItem::Child(child) => {
                    if !seen_children.insert(child.name.clone()) {
                        self.issues.report(
                            IssueKind::DuplicateNodeName,
                            self.location(child.name_span),
                            format!("duplicate node name '{}'", child.name),
                        );
                    }
                    self.merge_child(node, child)?;
                }
                BodyItem::DeleteNode(directive) => {
                    if let DeleteTarget::Name(name) = &directive.target {
                        seen_children.remove(name);
                    }
                    self.delete_node(Some(node), directive)?;
                }
                BodyItem::DeleteProperty(directive) => {
                    seen_properties.remove(&directive.name);
                    self.delete_property(node, directive);
                }
            }
        }
        Ok(())
    }

    fn merge_property(&mut self, node: NodeId, decl: &PropertyDecl) -> PropertyId {
        let previous = self.graph.node(node).properties.get(&decl.name).copied();
        let labels = decl
            .labels
            .iter()
            .map(|l| LabelOccurrence {
                name: l.name.clone(),
                location: self.location(l.span),
            })
            .collect();
        let id = self.graph.alloc_property(PropertyData {
            name: decl.name.clone(),
            owner: node,
            values: decl.values.clone(),
            labels,
            location: self.location(decl.span),
            name_location: self.location(decl.name_span),
            order: self.order(decl.span),
            replaces: previous,
            replaced_by: None,
            deleted_by: None,
            nexus: OnceLock::new(),
        });
        if let Some(previous) = previous {
            self.graph.property_mut(previous).replaced_by = Some(id);
        }
        // Overriding keeps the original insertion slot.
        self.graph
            .node_mut(node)
            .properties
            .insert(decl.name.clone(), id);
        id
    }

    fn merge_child(&mut self, parent: NodeId, child: &ChildNodeFragment) -> Result<(), BuildError> {
        let node = match self.graph.child_by_name(parent, &child.name, true) {
            Some(existing) => existing,
            None => self.graph.alloc_node(child.name.clone(), Some(parent)),
        };
        let definition = Definition {
            kind: DefinitionKind::Child,
            location: self.location(child.span),
            name_location: self.location(child.name_span),
            order: self.order(child.span),
        };
        self.graph.node_mut(node).definitions.push(definition);
        self.attach_labels(node, &child.labels, false);
        self.merge_body(node, &child.body)
    }

    fn delete_node(
        &mut self,
        scope: Option<NodeId>,
        directive: &DeleteNodeDirective,
    ) -> Result<(), BuildError> {
        let (target, text) = match (&directive.target, scope) {
            (DeleteTarget::Name(name), Some(parent)) => (
                self.graph.child_by_name(parent, name, true),
                name.full_name(),
            ),
            (DeleteTarget::Name(name), None) => {
                (self.walk_path(&join_path("/", &name.full_name()), false), name.full_name())
            }
            (DeleteTarget::Ref(target), _) => (self.resolve_ref(target, false), target.to_string()),
        };
        // The root has no parent to detach from.
        let target = target.filter(|&n| self.graph.node(n).parent.is_some());

        let id = self.graph.alloc_directive(DeleteDirective {
            kind: DeleteKind::Node,
            target: text.clone(),
            location: self.location(directive.span),
            target_location: self.location(directive.target_span),
            order: self.order(directive.span),
            scope,
            removed: target.map(DeletedEntity::Node),
        });

        match target {
            Some(node) => self.detach_node(node, id),
            None => {
                self.issues.report(
                    IssueKind::NodeDoesNotExist,
                    self.location(directive.target_span),
                    format!("node '{text}' does not exist"),
                );
                Ok(())
            }
        }
    }

    fn detach_node(&mut self, node: NodeId, directive: DirectiveId) -> Result<(), BuildError> {
        let Some(parent) = self.graph.node(node).parent else {
            return Err(BuildError::invariant("detaching a node without parent"));
        };
        let children = &mut self.graph.node_mut(parent).children;
        let Some(index) = children.iter().position(|&c| c == node) else {
            tracing::warn!("[BUILD] live node {node:?} missing from its parent's children");
            return Err(BuildError::invariant(format!(
                "node {node:?} is not a child of {parent:?}"
            )));
        };
        children.remove(index);

        let parent_data = self.graph.node_mut(parent);
        parent_data.deleted_children.push(DeleteRecord {
            entity: DeletedEntity::Node(node),
            directive,
        });
        self.graph.node_mut(node).deleted_by = Some(directive);

        if self.options.report_deleted_entities {
            let directive_location = self.graph.directive(directive).location;
            let data = self.graph.node(node);
            let what = format!("node '{}'", data.full_name());
            let spans: Vec<Location> = data
                .definitions
                .iter()
                .chain(data.referenced_by.iter())
                .map(|d| d.location)
                .collect();
            for location in spans {
                self.issues.deleted(location, directive_location, &what);
            }
        }
        Ok(())
    }

    fn delete_property(&mut self, node: NodeId, directive: &DeletePropertyDirective) {
        let removed = self
            .graph
            .node_mut(node)
            .properties
            .shift_remove(&directive.name);

        let id = self.graph.alloc_directive(DeleteDirective {
            kind: DeleteKind::Property,
            target: directive.name.to_string(),
            location: self.location(directive.span),
            target_location: self.location(directive.name_span),
            order: self.order(directive.span),
            scope: Some(node),
            removed: removed.map(DeletedEntity::Property),
        });

        let Some(property) = removed else {
            self.issues.report(
                IssueKind::PropertyDoesNotExist,
                self.location(directive.name_span),
                format!("property '{}' does not exist", directive.name),
            );
            return;
        };

        self.graph.property_mut(property).deleted_by = Some(id);
        self.graph
            .node_mut(node)
            .deleted_properties
            .push(DeleteRecord {
                entity: DeletedEntity::Property(property),
                directive: id,
            });

        if self.options.report_deleted_entities {
            let directive_location = self.graph.directive(id).location;
            let what = format!("property '{}'", directive.name);
            let mut version = Some(property);
            while let Some(current) = version {
                let data = self.graph.property(current);
                let location = data.location;
                version = data.replaces;
                self.issues.deleted(location, directive_location, &what);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Post pass: phandles
    // ------------------------------------------------------------------------

    fn assign_phandles(&mut self) {
        for index in 0..self.graph.nodes.len() {
            let node = NodeId::new(index);
            let value = self
                .graph
                .node(node)
                .properties
                .get("phandle")
                .and_then(|&p| self.phandle_value(p));
            self.graph.node_mut(node).phandle = value;
        }

        if !self.options.report_duplicate_phandles {
            return;
        }
        let mut holders: FxHashMap<u64, NodeId> = FxHashMap::default();
        for node in self.graph.descendants(self.graph.root) {
            let Some(value) = self.graph.node(node).phandle else {
                continue;
            };
            if let Some(&first) = holders.get(&value) {
                let location = self
                    .graph
                    .live_property(node, "phandle")
                    .map(|p| self.graph.property(p).location)
                    .unwrap_or_default();
                let first_path = self.graph.path_of(first);
                self.issues.report(
                    IssueKind::DuplicatePhandle,
                    location,
                    format!("phandle {value:#x} is already used by {first_path}"),
                );
            } else {
                holders.insert(value, node);
            }
        }
    }

    fn phandle_value(&self, property: PropertyId) -> Option<u64> {
        let values = &self.graph.property(property).values;
        match flatten(values).first()? {
            Value::Expr(expr) => self
                .graph
                .evaluator
                .evaluate(expr)
                .and_then(|v| u64::try_from(v).ok()),
            _ => None,
        }
    }
}
