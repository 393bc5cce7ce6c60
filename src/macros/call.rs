//! Macro call trees.
//!
//! `DT_PROP(DT_NODELABEL(uart0), current_speed)` becomes an arena of
//! [`MacroCallNode`]s: one call with two arguments, the first itself a call.
//! Arguments that are not a single identifier, number, string or call are
//! kept as raw text leaves.

use crate::base::{Name, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallId(pub u32);

impl CallId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `NAME(args...)`
    Call,
    /// Bare identifier
    Ident,
    /// Integer or character literal
    Number,
    /// `"text"`, quotes included
    Str,
    /// Anything else, kept verbatim
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCallNode {
    pub kind: CallKind,
    /// Macro name for calls, source text for leaves.
    pub name: Name,
    pub args: Vec<CallId>,
    pub parent: Option<CallId>,
    pub arg_index: usize,
    pub range: TextRange,
}

impl MacroCallNode {
    pub fn is_call(&self) -> bool {
        self.kind == CallKind::Call
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroCallTree {
    nodes: Vec<MacroCallNode>,
}

impl MacroCallTree {
    /// The outermost node. Trees are never empty once parsed.
    pub fn root(&self) -> CallId {
        CallId(0)
    }

    pub fn node(&self, id: CallId) -> &MacroCallNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: CallId) -> Option<&MacroCallNode> {
        self.nodes.get(id.index())
    }

    pub fn name(&self, id: CallId) -> &str {
        &self.node(id).name
    }

    pub fn args(&self, id: CallId) -> &[CallId] {
        &self.node(id).args
    }

    pub fn arg(&self, id: CallId, index: usize) -> Option<CallId> {
        self.node(id).args.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CallId> {
        (0..self.nodes.len() as u32).map(CallId)
    }

    /// Source text of a subtree, normalized (`NAME(a, b)`).
    pub fn text(&self, id: CallId) -> String {
        let node = self.node(id);
        if !node.is_call() {
            return node.name.to_string();
        }
        let args: Vec<String> = node.args.iter().map(|&a| self.text(a)).collect();
        format!("{}({})", node.name, args.join(", "))
    }

    /// Innermost call whose range contains `offset`.
    pub fn innermost_call_at(&self, offset: crate::base::TextSize) -> Option<CallId> {
        self.ids()
            .filter(|&id| {
                let node = self.node(id);
                node.is_call() && node.range.contains_inclusive(offset)
            })
            .min_by_key(|&id| self.node(id).range.len())
    }

    pub(crate) fn push(
        &mut self,
        kind: CallKind,
        name: impl Into<Name>,
        parent: Option<CallId>,
        arg_index: usize,
        range: TextRange,
    ) -> CallId {
        let id = CallId(self.nodes.len() as u32);
        self.nodes.push(MacroCallNode {
            kind,
            name: name.into(),
            args: Vec::new(),
            parent,
            arg_index,
            range,
        });
        id
    }

    pub(crate) fn set_args(&mut self, id: CallId, args: Vec<CallId>) {
        self.nodes[id.index()].args = args;
    }

    pub(crate) fn set_range(&mut self, id: CallId, range: TextRange) {
        self.nodes[id.index()].range = range;
    }

    /// Drop every node allocated after `len` (parser backtracking).
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }
}
