//! Read-only navigation over a built [`Graph`].

use std::sync::Arc;

use crate::base::{Name, to_macro_ident};
use crate::syntax::{NodeName, Value, flatten};

use super::graph::{DeletedEntity, Graph};
use super::ids::{DirectiveId, NodeId, PropertyId};
use super::types::NodeType;

impl Graph {
    // ========================================================================
    // STRUCTURE
    // ========================================================================

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// A node is live when neither it nor any ancestor has been deleted.
    pub fn is_live(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let data = self.node(id);
            if data.deleted_by.is_some() {
                return false;
            }
            current = data.parent;
        }
        true
    }

    /// Pre-order walk of `node` and its live descendants.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    /// Absolute path, `/` for the root. Placeholder nodes have an empty path.
    pub fn path_of(&self, node: NodeId) -> String {
        if node == self.root {
            return "/".to_string();
        }
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let data = self.node(id);
            if data.parent.is_none() {
                break;
            }
            segments.push(data.full_name());
            current = data.parent;
        }
        if segments.is_empty() {
            return String::new();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    // ========================================================================
    // CHILD LOOKUP
    // ========================================================================

    /// Live child of `parent` matching `wanted`.
    ///
    /// Strict lookup requires name and address to match exactly. Otherwise
    /// an address-less `wanted` prefers an unaddressed child and falls back
    /// to the first child with that name.
    pub fn child_by_name(&self, parent: NodeId, wanted: &NodeName, strict: bool) -> Option<NodeId> {
        pick_child(
            self.node(parent).children.iter().copied(),
            |id| &self.node(id).name,
            wanted,
            strict,
        )
    }

    /// Walk `path` from `from`. An absolute path starts at the root.
    pub fn get_child(&self, from: NodeId, path: &str, strict: bool) -> Option<NodeId> {
        let mut current = if path.starts_with('/') { self.root } else { from };
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_by_name(current, &NodeName::parse(segment), strict)?;
        }
        Some(current)
    }

    /// Live node at an absolute path.
    pub fn get_node(&self, path: &str) -> Option<NodeId> {
        if !path.starts_with('/') {
            return None;
        }
        self.get_child(self.root, path, false)
    }

    /// Like [`get_child`](Self::get_child), but a deleted child still counts
    /// as present when `in_scope` says its directive is not yet in effect.
    pub fn get_child_from_scope(
        &self,
        from: NodeId,
        path: &str,
        in_scope: impl Fn(DirectiveId) -> bool,
    ) -> Option<NodeId> {
        let mut current = if path.starts_with('/') { self.root } else { from };
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let wanted = NodeName::parse(segment);
            let data = self.node(current);
            let resurrected = data.deleted_children.iter().filter_map(|r| match r.entity {
                DeletedEntity::Node(id) if !in_scope(r.directive) => Some(id),
                _ => None,
            });
            current = pick_child(resurrected, |id| &self.node(id).name, &wanted, false)
                .or_else(|| self.child_by_name(current, &wanted, false))?;
        }
        Some(current)
    }

    /// Property `name` of `node` as seen by a query for which `in_scope`
    /// decides which delete directives already apply.
    pub fn property_from_scope(
        &self,
        node: NodeId,
        name: &str,
        in_scope: impl Fn(DirectiveId) -> bool,
    ) -> Option<PropertyId> {
        let data = self.node(node);
        let deleted = data.deleted_properties.iter().find_map(|r| match r.entity {
            DeletedEntity::Property(id)
                if !in_scope(r.directive) && self.property(id).name == name =>
            {
                Some(id)
            }
            _ => None,
        });
        deleted.or_else(|| self.live_property(node, name))
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    pub fn live_property(&self, node: NodeId, name: &str) -> Option<PropertyId> {
        self.node(node).properties.get(name).copied()
    }

    /// Live property whose macro-identifier form is `ident` (`clock_frequency`).
    pub fn property_by_ident(&self, node: NodeId, ident: &str) -> Option<PropertyId> {
        self.node(node)
            .properties
            .iter()
            .find(|(name, _)| to_macro_ident(name) == ident)
            .map(|(_, &id)| id)
    }

    pub fn property_values(&self, node: NodeId, name: &str) -> Option<&[Value]> {
        self.live_property(node, name)
            .map(|id| self.property(id).values.as_slice())
    }

    /// First string of a live property.
    pub fn string_property(&self, node: NodeId, name: &str) -> Option<&str> {
        self.property_values(node, name)?
            .iter()
            .find_map(Value::as_str)
    }

    /// Every version of the property chain containing `property`, oldest first.
    pub fn version_chain(&self, property: PropertyId) -> Vec<PropertyId> {
        let mut oldest = property;
        while let Some(previous) = self.property(oldest).replaces {
            oldest = previous;
        }
        let mut chain = vec![oldest];
        let mut current = oldest;
        while let Some(next) = self.property(current).replaced_by {
            chain.push(next);
            current = next;
        }
        chain
    }

    // ========================================================================
    // LABELS, PHANDLES, REFERENCES
    // ========================================================================

    /// Live node a label names.
    pub fn resolve_label(&self, label: &str) -> Option<NodeId> {
        self.labels
            .node_of(label)
            .filter(|&node| self.is_live(node))
    }

    pub fn labels_of(&self, node: NodeId) -> Vec<Name> {
        let mut labels: Vec<Name> = Vec::new();
        for occurrence in &self.node(node).labels {
            if !labels.contains(&occurrence.name) {
                labels.push(occurrence.name.clone());
            }
        }
        labels
    }

    /// First live node, depth first, whose `phandle` equals `value`.
    pub fn get_phandle(&self, value: u64) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.node(n).phandle == Some(value))
    }

    /// Every live node holding `value`, depth first.
    pub fn get_all_phandle(&self, value: u64) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.node(n).phandle == Some(value))
            .collect()
    }

    /// Node a single value refers to: `&label`, `&{/path}` or a phandle cell.
    pub fn resolve_reference(&self, value: &Value) -> Option<NodeId> {
        match value {
            Value::LabelRef(label) => self.resolve_label(label),
            Value::PathRef(path) => self.get_node(path),
            Value::Expr(expr) => {
                let phandle = self.evaluator.evaluate(expr)?;
                self.get_phandle(u64::try_from(phandle).ok()?)
            }
            Value::Array(cells) if cells.len() == 1 => self.resolve_reference(&cells[0]),
            Value::Str(_) | Value::Array(_) | Value::Bytes(_) => None,
        }
    }

    /// Labels declared anywhere in the live subtree of `node`.
    pub fn all_descendants_labels(&self, node: NodeId) -> Vec<Name> {
        let mut out = Vec::new();
        for id in self.descendants(node) {
            for label in self.labels_of(id) {
                if !out.contains(&label) {
                    out.push(label);
                }
            }
        }
        out
    }

    /// `&label` values used by live properties in the subtree of `node`.
    pub fn node_ref_values(&self, node: NodeId) -> Vec<(PropertyId, Name)> {
        self.collect_refs(node, |v| match v {
            Value::LabelRef(l) => Some(l.clone()),
            _ => None,
        })
    }

    /// `&{/path}` values used by live properties in the subtree of `node`.
    pub fn node_path_ref_values(&self, node: NodeId) -> Vec<(PropertyId, Name)> {
        self.collect_refs(node, |v| match v {
            Value::PathRef(p) => Some(p.clone()),
            _ => None,
        })
    }

    fn collect_refs(
        &self,
        node: NodeId,
        pick: impl Fn(&Value) -> Option<Name>,
    ) -> Vec<(PropertyId, Name)> {
        let mut out = Vec::new();
        for id in self.descendants(node) {
            for &property in self.node(id).properties.values() {
                for value in flatten(&self.property(property).values) {
                    if let Some(name) = pick(value) {
                        out.push((property, name));
                    }
                }
            }
        }
        out
    }

    // ========================================================================
    // WELL-KNOWN NODES
    // ========================================================================

    pub fn compatibles(&self, node: NodeId) -> Vec<Name> {
        self.property_values(node, "compatible")
            .map(|values| {
                flatten(values)
                    .into_iter()
                    .filter_map(|v| v.as_str().map(Name::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `status` is missing, `"okay"` or `"ok"`.
    pub fn is_status_okay(&self, node: NodeId) -> bool {
        match self.string_property(node, "status") {
            None => self.live_property(node, "status").is_none(),
            Some(status) => status == "okay" || status == "ok",
        }
    }

    /// Node named by property `name` of `/aliases`.
    pub fn alias(&self, name: &str) -> Option<NodeId> {
        self.well_known("/aliases", name)
    }

    /// Node named by property `name` of `/chosen`.
    pub fn chosen(&self, name: &str) -> Option<NodeId> {
        self.well_known("/chosen", name)
    }

    fn well_known(&self, holder: &str, name: &str) -> Option<NodeId> {
        let holder = self.get_node(holder)?;
        let property = self
            .live_property(holder, name)
            .or_else(|| self.property_by_ident(holder, &to_macro_ident(name)))?;
        let value = *flatten(&self.property(property).values).first()?;
        match value {
            Value::Str(path) => self.get_node(path).or_else(|| self.resolve_label(path)),
            other => self.resolve_reference(other),
        }
    }

    /// Live nodes listing `compatible`, depth first.
    pub fn nodes_with_compatible(&self, compatible: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.compatibles(n).iter().any(|c| c == compatible))
            .collect()
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    /// Bus-aware binding type, computed once per snapshot.
    ///
    /// A bus-mandated child type from the parent wins over the node's own
    /// `compatible`.
    pub fn resolved_type(&self, node: NodeId) -> Option<Arc<NodeType>> {
        self.node(node)
            .resolved_type
            .get_or_init(|| {
                let parent_type = self.parent(node).and_then(|p| self.resolved_type(p));
                let bus = parent_type.as_ref().and_then(|t| t.bus.clone());
                if let (Some(parent_type), Some(bus)) = (&parent_type, &bus) {
                    if let Some(required) = parent_type.required_child_type(bus) {
                        return Some(required);
                    }
                }
                let compatibles = self.compatibles(node);
                self.bindings.resolve_type(&compatibles, bus.as_deref())
            })
            .clone()
    }
}

fn pick_child<'a>(
    candidates: impl Iterator<Item = NodeId>,
    name_of: impl Fn(NodeId) -> &'a NodeName,
    wanted: &NodeName,
    strict: bool,
) -> Option<NodeId> {
    let mut first_by_name = None;
    for id in candidates {
        let name = name_of(id);
        if name == wanted {
            return Some(id);
        }
        if first_by_name.is_none() && name.name == wanted.name {
            first_by_name = Some(id);
        }
    }
    if strict || wanted.address.is_some() {
        return None;
    }
    first_by_name
}
