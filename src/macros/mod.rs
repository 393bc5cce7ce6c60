//! Macro Resolution Engine for `DT_*` accessor expressions.
//!
//! ## Key Types
//!
//! - [`MacroCallTree`] - Parsed macro expression, one arena per expression
//! - [`MacroEnv`] - Preprocessor boundary (user defines, constant evaluation)
//! - [`MacroEngine`] - Resolves a call against a [`Graph`](crate::hir::Graph)
//! - [`Resolved`] - A node or a value with its source property
//!
//! ```text
//! "DT_PROP(DT_NODELABEL(uart0), current_speed)"
//!     │ parse_call
//!     ▼
//! MacroCallTree ──► MacroEngine::resolve ──► Resolved::Value(Int(115200))
//!                        │
//!                        └── unknown names ──► MacroEnv::expand ──► resolve again
//! ```

mod call;
mod engine;
mod env;
mod parser;
mod value;

pub use call::{CallId, CallKind, MacroCallNode, MacroCallTree};
pub use engine::{DEFAULT_MAX_DEPTH, MacroEngine, resolve};
pub use env::{MacroEnv, PreprocessorEnv};
pub use crate::syntax::lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{call_at_offset, parse_call};
pub use value::{MacroValue, Resolved};
