//! What a macro expression resolves to.

use std::fmt;

use crate::base::Name;
use crate::hir::{Graph, NodeId, PropertyId};

/// Scalar or aggregate value produced by a value-form macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroValue {
    Int(i64),
    Bool(bool),
    /// A C string literal (`DT_PROP` of a string property)
    Str(Name),
    /// A bare token (`DT_STRING_TOKEN`, `DT_NODE_FULL_NAME_TOKEN`)
    Token(Name),
    Bytes(Vec<u8>),
    /// A reference value that names a node
    Node(NodeId),
    Array(Vec<MacroValue>),
    /// Cell expression the evaluator could not reduce
    Expr(String),
}

impl MacroValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MacroValue::Int(n) => Some(*n),
            MacroValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            MacroValue::Node(node) => Some(*node),
            _ => None,
        }
    }

    /// Render for display; nodes are shown by path.
    pub fn render(&self, graph: &Graph) -> String {
        match self {
            MacroValue::Node(node) => graph.path_of(*node),
            MacroValue::Array(items) => {
                let items: Vec<String> = items.iter().map(|i| i.render(graph)).collect();
                format!("{{{}}}", items.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for MacroValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroValue::Int(n) => write!(f, "{n}"),
            MacroValue::Bool(b) => write!(f, "{}", *b as i64),
            MacroValue::Str(s) => write!(f, "\"{s}\""),
            MacroValue::Token(t) => write!(f, "{t}"),
            MacroValue::Bytes(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{b:#04x}")).collect();
                write!(f, "{{{}}}", hex.join(", "))
            }
            MacroValue::Node(node) => write!(f, "node#{}", node.0),
            MacroValue::Array(items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            MacroValue::Expr(text) => write!(f, "{text}"),
        }
    }
}

/// Result of resolving one macro expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Node(NodeId),
    Value {
        value: MacroValue,
        /// Property the value was read from, if any.
        source: Option<PropertyId>,
    },
}

impl Resolved {
    pub fn value(value: MacroValue) -> Self {
        Resolved::Value {
            value,
            source: None,
        }
    }

    pub fn from_property(value: MacroValue, property: PropertyId) -> Self {
        Resolved::Value {
            value,
            source: Some(property),
        }
    }

    /// Node this resolves to, including reference values.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Resolved::Node(node) => Some(*node),
            Resolved::Value { value, .. } => value.as_node(),
        }
    }

    pub fn as_value(&self) -> Option<&MacroValue> {
        match self {
            Resolved::Value { value, .. } => Some(value),
            Resolved::Node(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value()?.as_int()
    }

    pub fn source(&self) -> Option<PropertyId> {
        match self {
            Resolved::Value { source, .. } => *source,
            Resolved::Node(_) => None,
        }
    }
}
