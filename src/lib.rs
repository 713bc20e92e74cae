//! Compile text filter queries such as `Title == "foo" && Rating > 10` into
//! backend-agnostic predicate trees.
//!
//! The pipeline is lexer → parser → predicate compiler. Operator tokens come
//! from a [`FilterConfig`], field paths are checked against a caller-supplied
//! [`Shape`].
//!
//! ```
//! use filter_compiler::{compile_filter, FilterConfig};
//! use filter_compiler::shape::{FieldKind, Shape};
//!
//! let config = FilterConfig::configure(|s| {
//!     s.comparison_aliases.greater_than_operator = "gt".to_string();
//! })
//! .unwrap();
//! let shape = Shape::new().field("Rating", FieldKind::Number);
//!
//! let predicate = compile_filter("Rating gt 10", &config, &shape).unwrap();
//! assert_eq!(predicate.to_string(), "Rating > 10");
//! ```

pub mod alias;
pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod resolver;
pub mod shape;
pub mod token;

use tracing::debug;

pub use ast::Node;
pub use compiler::PredicateCompiler;
pub use config::{FilterConfig, FilterSettings};
pub use error::{FilterError, Result};
pub use predicate::Predicate;
pub use shape::Shape;

use lexer::tokenize;
use parser::Parser;

/// Tokenize and parse `text` into an AST.
pub fn parse_filter(text: &str, config: &FilterConfig) -> Result<Node> {
    let tokens = tokenize(text, config.registry())?;
    debug!(tokens = tokens.len(), "tokenized filter");

    let ast = Parser::new(&tokens).parse()?;
    debug!(comparisons = ast.comparison_count(), "parsed filter");
    Ok(ast)
}

/// Run the whole pipeline: tokenize, parse, and compile `text` against `shape`.
pub fn compile_filter(text: &str, config: &FilterConfig, shape: &Shape) -> Result<Predicate> {
    let ast = parse_filter(text, config)?;
    let predicate = PredicateCompiler::new(config.settings()).compile(&ast, shape)?;
    debug!(%predicate, "compiled filter");
    Ok(predicate)
}
