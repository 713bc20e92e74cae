//! The token definition for the filter language.

use std::borrow::Cow;
use std::fmt;

use crate::ast::{CompOp, LiteralKind, LogicalOp};

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// A dotted field path, e.g. `Ingredients.Name`
    Identifier(&'a str),
    /// A literal value. Strings carry their unescaped content.
    Literal(LiteralKind, Cow<'a, str>),

    // Operators, resolved through the alias registry
    Comparison { op: CompOp, case_insensitive: bool },
    Logical(LogicalOp),

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,

    // Special
    Eof, // End of input
}

impl<'a> TokenKind<'a> {
    pub fn is_eof(&self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "field `{}`", name),
            TokenKind::Literal(LiteralKind::String, text) => write!(f, "string literal \"{}\"", text),
            TokenKind::Literal(kind, text) => write!(f, "{} literal `{}`", kind, text),
            TokenKind::Comparison { op, case_insensitive } => {
                write!(f, "operator `{}`", op.default_token())?;
                if *case_insensitive {
                    write!(f, " (case-insensitive)")?;
                }
                Ok(())
            }
            TokenKind::Logical(op) => write!(f, "logical operator `{}`", op.default_token()),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
