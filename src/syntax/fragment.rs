//! Source fragments handed over by the external grammar parser.
//!
//! A fragment is one top-level item of a source file in processing order:
//! a root node (`/ { ... };`), a reference node (`&label { ... };` or
//! `&{/path} { ... };`) or a top-level `/delete-node/ &label;`.
//!
//! The builder-style constructors let hosts and tests assemble fragments
//! without a parser:
//!
//! ```
//! use dtsa::base::FileId;
//! use dtsa::syntax::{ChildNodeFragment, SourceFragment, Value};
//!
//! let frag = SourceFragment::root(FileId::new(0))
//!     .child(ChildNodeFragment::new("soc").child(
//!         ChildNodeFragment::new("uart@1000")
//!             .label("uart1")
//!             .property("clock-frequency", [Value::cells([Value::int(100)])]),
//!     ));
//! assert!(frag.is_root());
//! ```

use crate::base::{FileId, Name, Span};

use super::value::Value;

/// `name` or `name@addr1,addr2` as written on a child node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName {
    pub name: Name,
    pub address: Option<Vec<u64>>,
}

impl NodeName {
    pub fn new(name: impl Into<Name>, address: Option<Vec<u64>>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Split `uart@1000` / `cpu@0,1` into name and hex address cells.
    ///
    /// A unit address that is not hex is kept as part of the name so it
    /// still compares byte-for-byte.
    pub fn parse(text: &str) -> Self {
        let Some((name, unit)) = text.split_once('@') else {
            return Self::new(text, None);
        };
        let cells: Option<Vec<u64>> = unit
            .split(',')
            .map(|cell| u64::from_str_radix(cell.trim_start_matches("0x"), 16).ok())
            .collect();
        match cells {
            Some(cells) if !cells.is_empty() => Self::new(name, Some(cells)),
            _ => Self::new(text, None),
        }
    }

    /// `name` or `name@a,b` with lower-case hex cells.
    pub fn full_name(&self) -> String {
        match &self.address {
            Some(address) => {
                let cells: Vec<String> = address.iter().map(|a| format!("{a:x}")).collect();
                format!("{}@{}", self.name, cells.join(","))
            }
            None => self.name.to_string(),
        }
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Target of a reference-node fragment or a top-level delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Label(Name),
    Path(Name),
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Label(l) => write!(f, "&{l}"),
            NodeRef::Path(p) => write!(f, "&{{{p}}}"),
        }
    }
}

/// `label:` attached to a node or property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecl {
    pub name: Name,
    pub span: Span,
}

/// One top-level item of a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFragment {
    pub file: FileId,
    pub kind: FragmentKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentKind {
    Root(RootNodeFragment),
    Reference(RefNodeFragment),
    DeleteNode(DeleteNodeDirective),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RootNodeFragment {
    pub labels: Vec<LabelDecl>,
    pub body: NodeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefNodeFragment {
    pub labels: Vec<LabelDecl>,
    pub target: NodeRef,
    pub target_span: Span,
    pub body: NodeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildNodeFragment {
    pub labels: Vec<LabelDecl>,
    pub name: NodeName,
    pub name_span: Span,
    pub body: NodeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeBody {
    pub items: Vec<BodyItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Property(PropertyDecl),
    Child(ChildNodeFragment),
    DeleteNode(DeleteNodeDirective),
    DeleteProperty(DeletePropertyDirective),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub labels: Vec<LabelDecl>,
    pub name: Name,
    pub name_span: Span,
    /// Empty for boolean properties (`ranges;`)
    pub values: Vec<Value>,
    pub span: Span,
}

/// What a `/delete-node/` names: a child by name inside a body, or a
/// reference at top level.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Name(NodeName),
    Ref(NodeRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNodeDirective {
    pub target: DeleteTarget,
    pub target_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePropertyDirective {
    pub name: Name,
    pub name_span: Span,
    pub span: Span,
}

// ============================================================================
// BUILDER-STYLE CONSTRUCTORS
// ============================================================================

fn label_decl(name: impl Into<Name>) -> LabelDecl {
    LabelDecl {
        name: name.into(),
        span: Span::default(),
    }
}

impl SourceFragment {
    /// `/ { };`
    pub fn root(file: FileId) -> Self {
        Self {
            file,
            kind: FragmentKind::Root(RootNodeFragment::default()),
        }
    }

    /// `&label { };`
    pub fn reference(file: FileId, label: impl Into<Name>) -> Self {
        Self::reference_to(file, NodeRef::Label(label.into()))
    }

    /// `&{/path} { };`
    pub fn reference_path(file: FileId, path: impl Into<Name>) -> Self {
        Self::reference_to(file, NodeRef::Path(path.into()))
    }

    fn reference_to(file: FileId, target: NodeRef) -> Self {
        Self {
            file,
            kind: FragmentKind::Reference(RefNodeFragment {
                labels: Vec::new(),
                target,
                target_span: Span::default(),
                body: NodeBody::default(),
                span: Span::default(),
            }),
        }
    }

    /// Top-level `/delete-node/ &label;`
    pub fn delete_node(file: FileId, target: NodeRef) -> Self {
        Self {
            file,
            kind: FragmentKind::DeleteNode(DeleteNodeDirective {
                target: DeleteTarget::Ref(target),
                target_span: Span::default(),
                span: Span::default(),
            }),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, FragmentKind::Root(_))
    }

    /// Span covering the whole fragment.
    pub fn span(&self) -> Span {
        match &self.kind {
            FragmentKind::Root(r) => r.span,
            FragmentKind::Reference(r) => r.span,
            FragmentKind::DeleteNode(d) => d.span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        match &mut self.kind {
            FragmentKind::Root(r) => r.span = span,
            FragmentKind::Reference(r) => r.span = span,
            FragmentKind::DeleteNode(d) => d.span = span,
        }
        self
    }

    /// Span of the target as written (`&uart1`, `&{/soc}`).
    pub fn target_at(mut self, span: Span) -> Self {
        match &mut self.kind {
            FragmentKind::Reference(r) => r.target_span = span,
            FragmentKind::DeleteNode(d) => d.target_span = span,
            FragmentKind::Root(_) => {}
        }
        self
    }

    pub fn label(mut self, name: impl Into<Name>) -> Self {
        match &mut self.kind {
            FragmentKind::Root(r) => r.labels.push(label_decl(name)),
            FragmentKind::Reference(r) => r.labels.push(label_decl(name)),
            FragmentKind::DeleteNode(_) => {}
        }
        self
    }

    fn body_mut(&mut self) -> Option<&mut NodeBody> {
        match &mut self.kind {
            FragmentKind::Root(r) => Some(&mut r.body),
            FragmentKind::Reference(r) => Some(&mut r.body),
            FragmentKind::DeleteNode(_) => None,
        }
    }

    pub fn item(mut self, item: BodyItem) -> Self {
        if let Some(body) = self.body_mut() {
            body.items.push(item);
        }
        self
    }

    pub fn child(self, child: ChildNodeFragment) -> Self {
        self.item(BodyItem::Child(child))
    }

    pub fn property(self, name: impl Into<Name>, values: impl IntoIterator<Item = Value>) -> Self {
        self.item(BodyItem::Property(PropertyDecl::new(name, values)))
    }

    pub fn delete_property(self, name: impl Into<Name>) -> Self {
        self.item(BodyItem::DeleteProperty(DeletePropertyDirective::new(name)))
    }

    pub fn delete_child(self, name: &str) -> Self {
        self.item(BodyItem::DeleteNode(DeleteNodeDirective::named(name)))
    }
}

impl ChildNodeFragment {
    pub fn new(name: &str) -> Self {
        Self {
            labels: Vec::new(),
            name: NodeName::parse(name),
            name_span: Span::default(),
            body: NodeBody::default(),
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name_at(mut self, span: Span) -> Self {
        self.name_span = span;
        self
    }

    pub fn label(mut self, name: impl Into<Name>) -> Self {
        self.labels.push(label_decl(name));
        self
    }

    pub fn item(mut self, item: BodyItem) -> Self {
        self.body.items.push(item);
        self
    }

    pub fn child(self, child: ChildNodeFragment) -> Self {
        self.item(BodyItem::Child(child))
    }

    pub fn property(self, name: impl Into<Name>, values: impl IntoIterator<Item = Value>) -> Self {
        self.item(BodyItem::Property(PropertyDecl::new(name, values)))
    }

    pub fn delete_property(self, name: impl Into<Name>) -> Self {
        self.item(BodyItem::DeleteProperty(DeletePropertyDirective::new(name)))
    }

    pub fn delete_child(self, name: &str) -> Self {
        self.item(BodyItem::DeleteNode(DeleteNodeDirective::named(name)))
    }
}

impl PropertyDecl {
    pub fn new(name: impl Into<Name>, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            labels: Vec::new(),
            name: name.into(),
            name_span: Span::default(),
            values: values.into_iter().collect(),
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name_at(mut self, span: Span) -> Self {
        self.name_span = span;
        self
    }
}

impl DeleteNodeDirective {
    pub fn named(name: &str) -> Self {
        Self {
            target: DeleteTarget::Name(NodeName::parse(name)),
            target_span: Span::default(),
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl DeletePropertyDirective {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            name_span: Span::default(),
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
