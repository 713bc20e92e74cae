//! Error types for the filter pipeline

use thiserror::Error;

use crate::compiler::CompileError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::token::Span;

/// Result type alias
pub type Result<T> = std::result::Result<T, FilterError>;

/// Any failure of a single filter compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

impl FilterError {
    /// Location of the offending text.
    pub fn span(&self) -> Span {
        match self {
            FilterError::Lex(err) => Span::new(err.position, err.position + 1),
            FilterError::Parse(err) => err.span,
            FilterError::Compile(err) => err.span(),
        }
    }

    /// Format the error with the source line and a caret marker underneath
    /// the offending span.
    pub fn render(&self, source: &str) -> String {
        let span = self.span();
        let start = floor_char_boundary(source, span.start.min(source.len()));
        let end = floor_char_boundary(source, span.end.min(source.len())).max(start);

        let indent = source[..start].chars().count();
        let width = source[start..end].chars().count().max(1);

        format!(
            "{}\n{}{}\n{}",
            source,
            " ".repeat(indent),
            "^".repeat(width),
            self
        )
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
