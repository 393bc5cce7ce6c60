//! Syntax boundary: value kinds, source fragments and C macro text.
//!
//! The grammar parser and preprocessor live outside this crate; they hand
//! over already-parsed fragments in file-processing order (base file first,
//! includes inline at their textual position, overlays after). Define
//! bodies and macro arguments are tokenized here and parsed as constant
//! expressions.

pub mod expr;
pub mod fragment;
pub mod lexer;
pub mod value;

pub use fragment::{
    BodyItem, ChildNodeFragment, DeleteNodeDirective, DeletePropertyDirective, DeleteTarget,
    FragmentKind, LabelDecl, NodeBody, NodeName, NodeRef, PropertyDecl, RefNodeFragment,
    RootNodeFragment, SourceFragment,
};
pub use expr::{parse_expression, parse_int_literal};
pub use value::{BinaryOp, Expression, IntLiteral, UnaryOp, Value, flatten};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
