//! Label registry.
//!
//! Labels are collected in a first pass with the path their fragment will
//! merge into, so `&label` resolves even when the label is declared later
//! in processing order. During the merge pass each label is bound to the
//! node it actually lands on; conflicts are detected against that binding.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::base::{Location, Name};

use super::ids::NodeId;

/// One `label:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub location: Location,
    /// Path of the node the declaring fragment merges into, when known.
    pub path: Option<String>,
    /// Declared on a `&ref { }` fragment rather than a node definition.
    pub from_reference: bool,
}

/// Outcome of binding a label to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// First time this label names a node.
    New,
    /// The label already names this node.
    Same,
    /// The label already names a different node.
    Conflict(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    declarations: IndexMap<Name, Vec<LabelEntry>>,
    bound: FxHashMap<Name, NodeId>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn declare(&mut self, name: Name, entry: LabelEntry) {
        self.declarations.entry(name).or_default().push(entry);
    }

    pub(crate) fn bind(&mut self, name: &Name, node: NodeId) -> Binding {
        match self.bound.get(name) {
            Some(&existing) if existing == node => Binding::Same,
            Some(&existing) => Binding::Conflict(existing),
            None => {
                self.bound.insert(name.clone(), node);
                Binding::New
            }
        }
    }

    /// Move `name` to `node`, releasing the previous holder.
    pub(crate) fn rebind(&mut self, name: &Name, node: NodeId) {
        self.bound.insert(name.clone(), node);
    }

    /// Path the label was first declared at.
    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.declarations
            .get(name)?
            .iter()
            .find_map(|e| e.path.as_deref())
    }

    /// Node the label is bound to after merge.
    pub fn node_of(&self, name: &str) -> Option<NodeId> {
        self.bound.get(name).copied()
    }

    pub fn declarations(&self, name: &str) -> &[LabelEntry] {
        self.declarations
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Label names in first-declaration order.
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.declarations.keys()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
