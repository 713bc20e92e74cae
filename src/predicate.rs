//! The compiled, backend-agnostic predicate tree.
//!
//! Field paths inside a quantifier are relative to the collection element.
//! An empty path stands for the element itself (collections of scalars).

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ast::CompOp;
use crate::config::Quantifier;
use crate::shape::ValueKind;

/// A literal coerced to the kind of the field it is compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    String(String),
    Number(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Null,
    List(Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The collection element itself.
    pub fn element() -> Self {
        Self(Vec::new())
    }

    pub fn is_element(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        if path.is_empty() {
            Self::element()
        } else {
            Self::new(path.split('.'))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Compare {
        field: FieldPath,
        kind: ValueKind,
        op: CompOp,
        value: Value,
        /// The backend lowercases both sides when evaluating.
        case_insensitive: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    /// At least one element of `collection` satisfies `predicate`.
    Any {
        collection: FieldPath,
        predicate: Box<Predicate>,
    },
    /// Every element of `collection` satisfies `predicate`.
    All {
        collection: FieldPath,
        predicate: Box<Predicate>,
    },
}

impl Predicate {
    pub fn compare(
        field: impl Into<FieldPath>,
        kind: ValueKind,
        op: CompOp,
        value: Value,
        case_insensitive: bool,
    ) -> Self {
        Predicate::Compare {
            field: field.into(),
            kind,
            op,
            value,
            case_insensitive,
        }
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    pub fn quantified(quantifier: Quantifier, collection: impl Into<FieldPath>, inner: Predicate) -> Self {
        let collection = collection.into();
        let predicate = Box::new(inner);
        match quantifier {
            Quantifier::Any => Predicate::Any {
                collection,
                predicate,
            },
            Quantifier::All => Predicate::All {
                collection,
                predicate,
            },
        }
    }

    /// Number of `Compare` leaves.
    pub fn compare_count(&self) -> usize {
        match self {
            Predicate::Compare { .. } => 1,
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.compare_count() + right.compare_count()
            }
            Predicate::Any { predicate, .. } | Predicate::All { predicate, .. } => {
                predicate.compare_count()
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_element() {
            f.write_str("@")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Null => f.write_str("null"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                field,
                op,
                value,
                case_insensitive,
                ..
            } => {
                let ci = if *case_insensitive { "*" } else { "" };
                write!(f, "{} {}{} {}", field, op.default_token(), ci, value)
            }
            Predicate::And(left, right) => write!(f, "({} && {})", left, right),
            Predicate::Or(left, right) => write!(f, "({} || {})", left, right),
            Predicate::Any {
                collection,
                predicate,
            } => write!(f, "{}.any({})", collection, predicate),
            Predicate::All {
                collection,
                predicate,
            } => write!(f, "{}.all({})", collection, predicate),
        }
    }
}
