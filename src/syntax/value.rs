//! Value-kind model produced by the external parser.
//!
//! Property values are an exhaustive sum type so every consumer matches on
//! all kinds; adding a kind is a compile error at each use site.

use crate::base::Name;

/// One component of a property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `"text"` (stored without quotes)
    Str(Name),
    /// A numeric or constant expression inside `< >`
    Expr(Expression),
    /// `&label`
    LabelRef(Name),
    /// `&{/path/to/node}`
    PathRef(Name),
    /// `< ... >` cell array; holds `Expr`, `LabelRef` and `PathRef` cells
    Array(Vec<Value>),
    /// `[de ad be ef]`
    Bytes(Vec<u8>),
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Expr(Expression::Lit(IntLiteral::Num(n)))
    }

    pub fn str(s: impl Into<Name>) -> Self {
        Value::Str(s.into())
    }

    pub fn label(l: impl Into<Name>) -> Self {
        Value::LabelRef(l.into())
    }

    pub fn path(p: impl Into<Name>) -> Self {
        Value::PathRef(p.into())
    }

    pub fn cells(cells: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(cells.into_iter().collect())
    }

    /// True for `&label` and `&{/path}` values.
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::LabelRef(_) | Value::PathRef(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Flatten a property value so `< >` arrays contribute their cells inline.
///
/// `compatible = "a", "b"` yields two strings, `reg = <1 2>, <3 4>` yields
/// four expressions.
pub fn flatten(values: &[Value]) -> Vec<&Value> {
    let mut out = Vec::new();
    for value in values {
        match value {
            Value::Array(cells) => out.extend(cells.iter()),
            other => out.push(other),
        }
    }
    out
}

/// Constant expression as written in a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Lit(IntLiteral),
    /// A macro constant that survived preprocessing (e.g. `GPIO_ACTIVE_LOW`)
    Ident(Name),
    Unary(UnaryOp, Box<Expression>),
    Binary(Box<Expression>, BinaryOp, Box<Expression>),
    Ternary {
        cond: Box<Expression>,
        then: Box<Expression>,
        else_: Box<Expression>,
    },
}

impl From<i64> for Box<Expression> {
    fn from(i: i64) -> Self {
        Expression::Lit(i.into()).into()
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Lit(IntLiteral::Num(n)) => write!(f, "{n}"),
            Expression::Lit(IntLiteral::Char(c)) => write!(f, "'{c}'"),
            Expression::Ident(name) => write!(f, "{name}"),
            Expression::Unary(op, e) => write!(f, "{}{e}", op.symbol()),
            Expression::Binary(l, op, r) => write!(f, "({l} {} {r})", op.symbol()),
            Expression::Ternary { cond, then, else_ } => {
                write!(f, "({cond} ? {then} : {else_})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntLiteral {
    Num(i64),
    Char(char),
}

impl IntLiteral {
    pub fn value(&self) -> i64 {
        match self {
            IntLiteral::Num(n) => *n,
            IntLiteral::Char(c) => *c as i64,
        }
    }
}

impl From<i64> for IntLiteral {
    fn from(i: i64) -> Self {
        IntLiteral::Num(i)
    }
}

impl From<char> for IntLiteral {
    fn from(c: char) -> Self {
        IntLiteral::Char(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
    LogicalNot,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogicalNot => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }
}
