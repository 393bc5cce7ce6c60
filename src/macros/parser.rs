//! Call-tree parser over [`tokenize`](crate::syntax::lexer::tokenize) output.

use text_size::{TextRange, TextSize};

use super::call::{CallId, CallKind, MacroCallTree};
use crate::syntax::lexer::{Token, TokenKind, tokenize};

/// Parse one macro expression (`NAME(args...)`, an identifier or a literal).
///
/// Returns `None` when the text does not start with one. Trailing text
/// after the expression is ignored.
pub fn parse_call(text: &str) -> Option<MacroCallTree> {
    let tokens = tokenize(text);
    let mut parser = Parser::new(text, &tokens);
    parser.parse_expr(None, 0)?;
    Some(parser.tree)
}

/// Find the innermost call covering byte `offset` in a line of C source.
///
/// Every top-level `NAME(` is tried as a tree root; the first whose range
/// contains the offset wins.
pub fn call_at_offset(source: &str, offset: TextSize) -> Option<(MacroCallTree, CallId)> {
    let tokens = tokenize(source);
    let mut index = 0;
    while index < tokens.len() {
        let starts_call = tokens[index].kind == TokenKind::Ident
            && tokens.get(index + 1).map(|t| t.kind) == Some(TokenKind::LParen);
        if !starts_call || tokens[index].offset > offset {
            index += 1;
            continue;
        }
        let mut parser = Parser::new(source, &tokens);
        parser.pos = index;
        if parser.parse_expr(None, 0).is_none() {
            index += 1;
            continue;
        }
        let root = parser.tree.node(parser.tree.root()).range;
        if root.contains_inclusive(offset) {
            let call = parser.tree.innermost_call_at(offset)?;
            return Some((parser.tree, call));
        }
        index = parser.pos.max(index + 1);
    }
    None
}

struct Parser<'s, 't> {
    source: &'s str,
    tokens: &'t [Token<'s>],
    pos: usize,
    tree: MacroCallTree,
}

impl<'s, 't> Parser<'s, 't> {
    fn new(source: &'s str, tokens: &'t [Token<'s>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            tree: MacroCallTree::default(),
        }
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn parse_expr(&mut self, parent: Option<CallId>, arg_index: usize) -> Option<CallId> {
        let token = self.tokens.get(self.pos)?.clone();
        let kind = match token.kind {
            TokenKind::Ident => CallKind::Ident,
            TokenKind::Number | TokenKind::Char => CallKind::Number,
            TokenKind::Str => CallKind::Str,
            _ => return None,
        };
        self.pos += 1;

        if kind != CallKind::Ident || self.peek() != Some(TokenKind::LParen) {
            let range = TextRange::new(token.offset, token.end());
            return Some(self.tree.push(kind, token.text, parent, arg_index, range));
        }

        let id = self.tree.push(
            CallKind::Call,
            token.text,
            parent,
            arg_index,
            TextRange::empty(token.offset),
        );
        self.pos += 1; // (

        let mut args = Vec::new();
        if self.peek() == Some(TokenKind::RParen) {
            let end = self.tokens[self.pos].end();
            self.pos += 1;
            self.tree.set_range(id, TextRange::new(token.offset, end));
            return Some(id);
        }
        loop {
            let arg = self.parse_arg(id, args.len())?;
            args.push(arg);
            match self.peek()? {
                TokenKind::Comma => self.pos += 1,
                TokenKind::RParen => {
                    let end = self.tokens[self.pos].end();
                    self.pos += 1;
                    self.tree.set_args(id, args);
                    self.tree.set_range(id, TextRange::new(token.offset, end));
                    return Some(id);
                }
                _ => return None,
            }
        }
    }

    /// One argument: a structured expression when it fills the whole
    /// argument, otherwise the raw text up to the next top-level `,` or `)`.
    fn parse_arg(&mut self, parent: CallId, arg_index: usize) -> Option<CallId> {
        let start_pos = self.pos;
        let start_len = self.tree.len();
        if let Some(id) = self.parse_expr(Some(parent), arg_index) {
            if matches!(self.peek(), Some(TokenKind::Comma | TokenKind::RParen)) {
                return Some(id);
            }
        }
        self.pos = start_pos;
        self.tree.truncate(start_len);

        let mut depth = 0usize;
        let start = self.tokens.get(self.pos)?.offset;
        let mut end = start;
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::Comma | TokenKind::RParen if depth == 0 => break,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            end = token.end();
            self.pos += 1;
        }
        let range = TextRange::new(start, end);
        let text = &self.source[range];
        Some(
            self.tree
                .push(CallKind::Raw, text.trim(), Some(parent), arg_index, range),
        )
    }
}
