//! Preprocessor boundary seen by the macro engine.

use crate::base::Name;
use crate::hir::{ConstEvaluator, MacroTable};

use crate::syntax::lexer::{TokenKind, tokenize};

use super::call::{CallId, CallKind, MacroCallTree};
use super::parser::parse_call;

/// Macro definitions and constant evaluation in scope at one location.
pub trait MacroEnv: Send + Sync {
    /// Expand a user macro at `call` one level. `None` when `call` is not a
    /// user macro (or has the wrong arity).
    fn expand(&self, tree: &MacroCallTree, call: CallId) -> Option<MacroCallTree>;

    /// Evaluate argument text such as `3`, `MY_IDX` or `(1 << IDX)`.
    fn evaluate(&self, text: &str) -> Option<i64>;

    /// Body of an object-like define (`DT_DRV_COMPAT`).
    fn object(&self, name: &str) -> Option<String>;
}

/// [`MacroEnv`] backed by a [`MacroTable`].
#[derive(Debug, Clone, Default)]
pub struct PreprocessorEnv {
    table: MacroTable,
}

impl PreprocessorEnv {
    pub fn new(table: MacroTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MacroTable {
        &self.table
    }
}

impl MacroEnv for PreprocessorEnv {
    fn expand(&self, tree: &MacroCallTree, call: CallId) -> Option<MacroCallTree> {
        let node = tree.node(call);
        match node.kind {
            CallKind::Ident => parse_call(self.table.object(&node.name)?),
            CallKind::Call => {
                let function = self.table.function(&node.name)?;
                if function.params.len() != node.args.len() {
                    return None;
                }
                let args: Vec<String> = node.args.iter().map(|&a| tree.text(a)).collect();
                parse_call(&substitute(&function.body, &function.params, &args))
            }
            CallKind::Number | CallKind::Str | CallKind::Raw => None,
        }
    }

    fn evaluate(&self, text: &str) -> Option<i64> {
        self.table.evaluate_text(text)
    }

    fn object(&self, name: &str) -> Option<String> {
        self.table.object(name).map(String::from)
    }
}

/// Replace parameter identifiers in `body` with argument text.
fn substitute(body: &str, params: &[Name], args: &[String]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut last = 0usize;
    for token in tokenize(body) {
        let start = usize::from(token.offset);
        out.push_str(&body[last..start]);
        let replacement = (token.kind == TokenKind::Ident)
            .then(|| params.iter().position(|p| p == token.text))
            .flatten()
            .and_then(|i| args.get(i))
            .map(String::as_str);
        out.push_str(replacement.unwrap_or(token.text));
        last = usize::from(token.end());
    }
    out.push_str(&body[last..]);
    out
}
