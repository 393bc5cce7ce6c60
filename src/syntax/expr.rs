//! Constant-expression parser for C macro text.
//!
//! Turns define bodies and raw macro arguments (`(1 << 0)`, `IDX + 1`,
//! `FAST ? 2 : 1`) into an [`Expression`] with C operator precedence.

use super::lexer::{Token, TokenKind, tokenize};
use super::value::{BinaryOp, Expression, UnaryOp};

/// Parse `text` as one constant expression.
///
/// Returns `None` when any token is left over or the text is not an
/// expression (strings, calls, unbalanced parentheses).
pub fn parse_expression(text: &str) -> Option<Expression> {
    let tokens = tokenize(text);
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.ternary()?;
    (parser.pos == tokens.len()).then_some(expr)
}

/// Parse a C integer literal: decimal, `0x` hex, leading-zero octal, with
/// optional `u`/`l` suffixes.
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if digits.is_empty() || !digits.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse::<u64>().ok()
    };
    parsed.map(|v| v as i64)
}

fn parse_char_literal(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// Binary operator and its binding power; higher binds tighter.
fn binary_op(text: &str) -> Option<(BinaryOp, u8)> {
    let op = match text {
        "||" => (BinaryOp::Or, 1),
        "&&" => (BinaryOp::And, 2),
        "|" => (BinaryOp::BitOr, 3),
        "^" => (BinaryOp::BitXor, 4),
        "&" => (BinaryOp::BitAnd, 5),
        "==" => (BinaryOp::Eq, 6),
        "!=" => (BinaryOp::Neq, 6),
        "<" => (BinaryOp::Lt, 7),
        ">" => (BinaryOp::Gt, 7),
        "<=" => (BinaryOp::Le, 7),
        ">=" => (BinaryOp::Ge, 7),
        "<<" => (BinaryOp::LShift, 8),
        ">>" => (BinaryOp::RShift, 8),
        "+" => (BinaryOp::Add, 9),
        "-" => (BinaryOp::Sub, 9),
        "*" => (BinaryOp::Mul, 10),
        "/" => (BinaryOp::Div, 10),
        "%" => (BinaryOp::Mod, 10),
        _ => return None,
    };
    Some(op)
}

struct ExprParser<'s, 't> {
    tokens: &'t [Token<'s>],
    pos: usize,
}

impl<'s> ExprParser<'s, '_> {
    fn peek_operator(&self) -> Option<&'s str> {
        self.tokens
            .get(self.pos)
            .filter(|t| t.kind == TokenKind::Other)
            .map(|t| t.text)
    }

    fn eat(&mut self, kind: TokenKind, text: &str) -> bool {
        let hit = self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == kind && t.text == text);
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// `cond ? then : else`, right associative.
    fn ternary(&mut self) -> Option<Expression> {
        let cond = self.binary(0)?;
        if !self.eat(TokenKind::Other, "?") {
            return Some(cond);
        }
        let then = self.ternary()?;
        if !self.eat(TokenKind::Other, ":") {
            return None;
        }
        let else_ = self.ternary()?;
        Some(Expression::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            else_: Box::new(else_),
        })
    }

    /// Precedence climbing over left-associative binary operators.
    fn binary(&mut self, min_power: u8) -> Option<Expression> {
        let mut lhs = self.unary()?;
        while let Some((op, power)) = self.peek_operator().and_then(binary_op) {
            if power < min_power {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(power + 1)?;
            lhs = Expression::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<Expression> {
        let op = match self.peek_operator() {
            Some("-") => UnaryOp::Neg,
            Some("~") => UnaryOp::BitNot,
            Some("!") => UnaryOp::LogicalNot,
            Some("+") => {
                self.pos += 1;
                return self.unary();
            }
            _ => return self.primary(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Some(Expression::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Option<Expression> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos)?;
        self.pos += 1;
        match token.kind {
            TokenKind::Number => parse_int_literal(token.text).map(|n| Expression::Lit(n.into())),
            TokenKind::Char => parse_char_literal(token.text).map(|c| Expression::Lit(c.into())),
            TokenKind::Ident => Some(Expression::Ident(token.text.into())),
            TokenKind::LParen => {
                let inner = self.ternary()?;
                self.eat(TokenKind::RParen, ")").then_some(inner)
            }
            _ => None,
        }
    }
}
