//! Predicate compiler that turns a parsed filter AST into a [`Predicate`] tree
//! checked against a [`Shape`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::trace;

use crate::ast::{CompOp, Comparison, Literal, LiteralKind, Node, Operand};
use crate::config::{FilterSettings, Quantifier};
use crate::predicate::{FieldPath, Predicate, Value};
use crate::resolver::{FieldResolver, ResolvedField};
use crate::shape::{Shape, ValueKind};
use crate::token::Span;

/// Semantic errors. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown field `{path}`")]
    UnknownField { path: String, span: Span },

    #[error("field `{path}` is a {expected} field but `{literal}` is a {found} literal")]
    TypeMismatch {
        path: String,
        expected: ValueKind,
        found: LiteralKind,
        literal: String,
        span: Span,
    },

    #[error("operator {operator} is not supported on {kind} field `{path}`")]
    UnsupportedOperator {
        path: String,
        operator: String,
        kind: ValueKind,
        span: Span,
    },

    #[error("invalid {expected} literal `{literal}` for field `{path}`: {reason}")]
    InvalidLiteral {
        path: String,
        literal: String,
        expected: ValueKind,
        reason: String,
        span: Span,
    },

    #[error("field `{path}` is a {kind} and can't be compared directly")]
    NotComparable { path: String, kind: String, span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnknownField { span, .. }
            | CompileError::TypeMismatch { span, .. }
            | CompileError::UnsupportedOperator { span, .. }
            | CompileError::InvalidLiteral { span, .. }
            | CompileError::NotComparable { span, .. } => *span,
        }
    }
}

/// Compiles AST nodes against a shape. Holds no per-query state and can be
/// reused for any number of compilations.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler {
    resolver: FieldResolver,
    quantifier: Quantifier,
}

impl Default for PredicateCompiler {
    fn default() -> Self {
        Self::new(&FilterSettings::default())
    }
}

impl PredicateCompiler {
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            resolver: FieldResolver::new(settings.field_case_sensitive),
            quantifier: settings.default_quantifier,
        }
    }

    /// Override the quantifier inserted for collection-crossing paths.
    pub fn with_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    pub fn compile(&self, node: &Node, shape: &Shape) -> Result<Predicate, CompileError> {
        match node {
            Node::Comparison(cmp) => self.compile_comparison(cmp, shape),
            Node::And(left, right) => Ok(Predicate::and(
                self.compile(left, shape)?,
                self.compile(right, shape)?,
            )),
            Node::Or(left, right) => Ok(Predicate::or(
                self.compile(left, shape)?,
                self.compile(right, shape)?,
            )),
            Node::Group(inner) => self.compile(inner, shape),
        }
    }

    fn compile_comparison(&self, cmp: &Comparison, shape: &Shape) -> Result<Predicate, CompileError> {
        let field = self.resolver.resolve(&cmp.field, cmp.field_span, shape)?;
        check_operator(cmp, &field)?;

        let value = match &cmp.operand {
            Operand::Scalar(literal) => {
                if literal.kind == LiteralKind::Null && !matches!(cmp.op, CompOp::Eq | CompOp::NotEq) {
                    return Err(unsupported(cmp, &field, format!("{} with null", cmp.op)));
                }
                coerce(literal, cmp, &field)?
            }
            Operand::List(items) => Value::List(
                items
                    .iter()
                    .map(|literal| coerce(literal, cmp, &field))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        trace!(field = %field.path(), op = %cmp.op, "compiled comparison");
        Ok(self.quantify(&field, cmp, value))
    }

    /// Build the `Compare` leaf for the part of the path past the last
    /// collection, then wrap it in one quantifier per collection level,
    /// innermost first.
    fn quantify(&self, field: &ResolvedField, cmp: &Comparison, value: Value) -> Predicate {
        let names: Vec<&str> = field.segments.iter().map(|s| s.name.as_str()).collect();
        let boundaries = field.collection_boundaries();
        let leaf_start = boundaries.last().map_or(0, |b| b + 1);

        let mut predicate = Predicate::compare(
            FieldPath::new(names[leaf_start..].iter().copied()),
            field.kind,
            cmp.op,
            value,
            cmp.case_insensitive,
        );

        for (i, &boundary) in boundaries.iter().enumerate().rev() {
            // lists of lists: the inner levels range over the element itself
            for _ in 1..field.segments[boundary].collection_depth {
                predicate = Predicate::quantified(self.quantifier, FieldPath::element(), predicate);
            }
            let scope_start = if i == 0 { 0 } else { boundaries[i - 1] + 1 };
            let collection = FieldPath::new(names[scope_start..=boundary].iter().copied());
            predicate = Predicate::quantified(self.quantifier, collection, predicate);
        }

        predicate
    }
}

fn unsupported(cmp: &Comparison, field: &ResolvedField, operator: String) -> CompileError {
    CompileError::UnsupportedOperator {
        path: cmp.field.clone(),
        operator,
        kind: field.kind,
        span: cmp.span,
    }
}

/// Operators are checked against the field kind before any literal is looked at.
fn check_operator(cmp: &Comparison, field: &ResolvedField) -> Result<(), CompileError> {
    let op = cmp.op;
    let supported = match field.kind {
        ValueKind::String => true,
        ValueKind::Number | ValueKind::Date => !op.is_text_match(),
        ValueKind::Boolean | ValueKind::Enum => !op.is_text_match() && !op.is_ordering(),
    };
    if !supported {
        return Err(unsupported(cmp, field, op.name().to_string()));
    }
    if cmp.case_insensitive && !matches!(field.kind, ValueKind::String | ValueKind::Enum) {
        return Err(unsupported(cmp, field, format!("{} (case-insensitive)", op)));
    }
    Ok(())
}

fn coerce(literal: &Literal, cmp: &Comparison, field: &ResolvedField) -> Result<Value, CompileError> {
    let invalid = |reason: String| CompileError::InvalidLiteral {
        path: cmp.field.clone(),
        literal: literal.text.clone(),
        expected: field.kind,
        reason,
        span: literal.span,
    };
    let text = literal.text.as_str();

    match (field.kind, literal.kind) {
        (_, LiteralKind::Null) => Ok(Value::Null),
        (ValueKind::String, LiteralKind::String) => Ok(Value::String(literal.text.clone())),
        (ValueKind::Number, LiteralKind::Number | LiteralKind::String) => Decimal::from_str(text.trim())
            .map(Value::Number)
            .map_err(|_| invalid("not a number".to_string())),
        (ValueKind::Boolean, LiteralKind::Boolean) => Ok(Value::Boolean(text == "true")),
        (ValueKind::Boolean, LiteralKind::String) => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(invalid("expected `true` or `false`".to_string())),
        },
        (ValueKind::Date, LiteralKind::Date | LiteralKind::String) => parse_temporal(text)
            .ok_or_else(|| invalid("expected YYYY-MM-DD or an ISO 8601 date-time".to_string())),
        (ValueKind::Enum, LiteralKind::String) => field
            .variants
            .iter()
            .find(|v| v.as_str() == text)
            .or_else(|| {
                cmp.case_insensitive
                    .then(|| field.variants.iter().find(|v| v.eq_ignore_ascii_case(text)))
                    .flatten()
            })
            .map(|v| Value::String(v.clone()))
            .ok_or_else(|| invalid(format!("expected one of {}", field.variants.join(", ")))),
        (expected, found) => Err(CompileError::TypeMismatch {
            path: cmp.field.clone(),
            expected,
            found,
            literal: literal.text.clone(),
            span: literal.span,
        }),
    }
}

/// `YYYY-MM-DD`, RFC 3339, or a date-time without offset (taken as UTC).
fn parse_temporal(text: &str) -> Option<Value> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::DateTime(datetime));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Value::DateTime(naive.and_utc().fixed_offset()))
}
