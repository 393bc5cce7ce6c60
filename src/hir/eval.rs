//! Constant-expression evaluator boundary.
//!
//! Cell values in the graph stay as [`Expression`]s; consumers that need a
//! number (phandles, `#*-cells`, specifier cells, macro indices) go through a
//! [`ConstEvaluator`]. The real build evaluates them with the C
//! preprocessor's arithmetic; [`MacroTable`] is the in-crate default that
//! mirrors it for literals, defines and the usual operator set.

use rustc_hash::FxHashMap;

use crate::base::Name;
use crate::syntax::{BinaryOp, Expression, UnaryOp, parse_expression};

/// Maximum nesting of define lookups before giving up (guards `#define A A`).
const MAX_DEFINE_DEPTH: usize = 16;

/// Evaluates constant expressions. `None` means "unresolved".
pub trait ConstEvaluator: Send + Sync {
    fn evaluate(&self, expr: &Expression) -> Option<i64>;

    /// Evaluate raw source text such as a macro argument (`3`, `MY_IDX + 1`).
    fn evaluate_text(&self, text: &str) -> Option<i64>;
}

/// A function-like `#define NAME(a, b) body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMacro {
    pub params: Vec<Name>,
    pub body: Name,
}

/// Table of preprocessor defines in scope at a textual location.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    objects: FxHashMap<Name, Name>,
    functions: FxHashMap<Name, FunctionMacro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `#define NAME body`
    pub fn define(&mut self, name: impl Into<Name>, body: impl Into<Name>) {
        self.objects.insert(name.into(), body.into());
    }

    /// `#define NAME(params...) body`
    pub fn define_function(
        &mut self,
        name: impl Into<Name>,
        params: impl IntoIterator<Item = impl Into<Name>>,
        body: impl Into<Name>,
    ) {
        self.functions.insert(
            name.into(),
            FunctionMacro {
                params: params.into_iter().map(Into::into).collect(),
                body: body.into(),
            },
        );
    }

    pub fn with(mut self, name: impl Into<Name>, body: impl Into<Name>) -> Self {
        self.define(name, body);
        self
    }

    pub fn object(&self, name: &str) -> Option<&str> {
        self.objects.get(name).map(|b| b.as_str())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionMacro> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.functions.is_empty()
    }

    fn eval_expr(&self, expr: &Expression, depth: usize) -> Option<i64> {
        match expr {
            Expression::Lit(lit) => Some(lit.value()),
            Expression::Ident(name) => self.eval_define(name, depth),
            Expression::Unary(op, e) => {
                let v = self.eval_expr(e, depth)?;
                match op {
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::BitNot => Some(!v),
                    UnaryOp::LogicalNot => Some((v == 0) as i64),
                }
            }
            Expression::Binary(l, op, r) => {
                let l = self.eval_expr(l, depth)?;
                let r = self.eval_expr(r, depth)?;
                apply_binary(*op, l, r)
            }
            Expression::Ternary { cond, then, else_ } => {
                if self.eval_expr(cond, depth)? != 0 {
                    self.eval_expr(then, depth)
                } else {
                    self.eval_expr(else_, depth)
                }
            }
        }
    }

    fn eval_define(&self, name: &str, depth: usize) -> Option<i64> {
        if depth >= MAX_DEFINE_DEPTH {
            tracing::warn!(name, "define expansion too deep");
            return None;
        }
        let body = self.objects.get(name)?;
        self.eval_text(body, depth + 1)
    }

    fn eval_text(&self, text: &str, depth: usize) -> Option<i64> {
        self.eval_expr(&parse_expression(text)?, depth)
    }
}

impl ConstEvaluator for MacroTable {
    fn evaluate(&self, expr: &Expression) -> Option<i64> {
        self.eval_expr(expr, 0)
    }

    fn evaluate_text(&self, text: &str) -> Option<i64> {
        self.eval_text(text, 0)
    }
}

fn apply_binary(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    let shift = || u32::try_from(r).ok();
    match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Mod => l.checked_rem(r),
        BinaryOp::BitAnd => Some(l & r),
        BinaryOp::BitOr => Some(l | r),
        BinaryOp::BitXor => Some(l ^ r),
        BinaryOp::LShift => l.checked_shl(shift()?),
        BinaryOp::RShift => l.checked_shr(shift()?),
        BinaryOp::And => Some((l != 0 && r != 0) as i64),
        BinaryOp::Or => Some((l != 0 || r != 0) as i64),
        BinaryOp::Eq => Some((l == r) as i64),
        BinaryOp::Neq => Some((l != r) as i64),
        BinaryOp::Lt => Some((l < r) as i64),
        BinaryOp::Gt => Some((l > r) as i64),
        BinaryOp::Le => Some((l <= r) as i64),
        BinaryOp::Ge => Some((l >= r) as i64),
    }
}
