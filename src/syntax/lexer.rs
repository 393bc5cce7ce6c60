//! Logos-based lexer for C macro text.
//!
//! Only what is needed to recover call structure and constant expressions:
//! identifiers, literals, parentheses, commas and operators. Two-character
//! operators (`<<`, `&&`, `!=`, ...) lex as one [`TokenKind::Other`]; every
//! other character is its own token.

use logos::Logos;
use text_size::TextSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Comment,
    Ident,
    Number,
    Str,
    Char,
    LParen,
    RParen,
    Comma,
    Other,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.inner.span().start as u32);

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Other,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize, dropping whitespace and comments.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).filter(|t| !t.kind.is_trivia()).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9a-zA-Z_]*")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"'([^'\\]|\\.)'")]
    Char,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[regex(r"<<|>>|<=|>=|==|!=|&&|\|\|")]
    Operator,

    #[regex(r"[^ \t\r\n()a-zA-Z0-9_,]", priority = 0)]
    Other,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::LineComment | LogosToken::BlockComment => TokenKind::Comment,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Number => TokenKind::Number,
            LogosToken::Str => TokenKind::Str,
            LogosToken::Char => TokenKind::Char,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Operator | LogosToken::Other => TokenKind::Other,
        }
    }
}
