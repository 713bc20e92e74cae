//! Target shape descriptors.
//!
//! A [`Shape`] describes the fields of the record type being filtered. It is
//! supplied by the caller and never modified during compilation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{read_json_file, ConfigError};

/// Field name to declared kind.
///
/// In JSON a shape is a plain object:
///
/// ```json
/// {
///   "Title": { "type": "string" },
///   "Tags": { "type": "collection", "of": { "type": "string" } },
///   "Author": { "type": "object", "fields": { "Name": { "type": "string" } } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape {
    fields: BTreeMap<String, FieldKind>,
}

/// Declared kind of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Enum { variants: Vec<String> },
    Object { fields: Shape },
    Collection { of: Box<FieldKind> },
}

/// Kind of a comparable (terminal) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<(&str, &FieldKind)> {
        self.fields
            .get_key_value(name)
            .map(|(name, kind)| (name.as_str(), kind))
    }

    /// ASCII case-insensitive lookup. An exact match wins, otherwise the first
    /// match in name order.
    pub fn get_ignore_case(&self, name: &str) -> Option<(&str, &FieldKind)> {
        self.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
                .map(|(name, kind)| (name.as_str(), kind))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        read_json_file(path.as_ref())
    }
}

impl FieldKind {
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Enum {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn object(fields: Shape) -> Self {
        FieldKind::Object { fields }
    }

    pub fn collection(of: FieldKind) -> Self {
        FieldKind::Collection { of: Box::new(of) }
    }

    /// The comparable kind, if this is a scalar field.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            FieldKind::String => Some(ValueKind::String),
            FieldKind::Number => Some(ValueKind::Number),
            FieldKind::Boolean => Some(ValueKind::Boolean),
            FieldKind::Date => Some(ValueKind::Date),
            FieldKind::Enum { .. } => Some(ValueKind::Enum),
            FieldKind::Object { .. } | FieldKind::Collection { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FieldKind::Object { .. } => "object".to_string(),
            FieldKind::Collection { of } => format!("collection of {}", of.describe()),
            scalar => scalar
                .value_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_deserialize_nested_shape() {
        let shape: Shape = serde_json::from_str(
            r#"{
                "Title": { "type": "string" },
                "Rating": { "type": "number" },
                "Visibility": { "type": "enum", "variants": ["Public", "Private"] },
                "Ingredients": {
                    "type": "collection",
                    "of": { "type": "object", "fields": { "Name": { "type": "string" } } }
                }
            }"#,
        )
        .unwrap();

        let expected = Shape::new()
            .field("Title", FieldKind::String)
            .field("Rating", FieldKind::Number)
            .field("Visibility", FieldKind::enumeration(["Public", "Private"]))
            .field(
                "Ingredients",
                FieldKind::collection(FieldKind::object(
                    Shape::new().field("Name", FieldKind::String),
                )),
            );
        assert_eq!(shape, expected);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<Shape, _> = serde_json::from_str(r#"{ "Title": { "type": "text" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_case_insensitive_lookup_prefers_exact_match() {
        let shape = Shape::new()
            .field("name", FieldKind::Number)
            .field("Name", FieldKind::String);
        assert_eq!(shape.get_ignore_case("Name"), Some(("Name", &FieldKind::String)));
        assert_eq!(shape.get_ignore_case("NAME"), Some(("Name", &FieldKind::String)));
        assert_eq!(shape.get("NAME"), None);
    }

    #[test]
    fn test_describe() {
        let kind = FieldKind::collection(FieldKind::object(Shape::new()));
        assert_eq!(kind.describe(), "collection of object");
        assert_eq!(FieldKind::Date.describe(), "date");
    }

    #[test]
    fn test_load_shape_from_json_file() {
        let file = write_temp(
            r#"{
                "Title": { "type": "string" },
                "Tags": { "type": "collection", "of": { "type": "string" } },
                "Author": {
                    "type": "object",
                    "fields": { "Born": { "type": "date" } }
                }
            }"#,
        );

        let shape = Shape::from_json_file(file.path()).unwrap();
        assert_eq!(shape.len(), 3);
        assert_eq!(shape.get("Tags").map(|(_, kind)| kind.describe()).as_deref(), Some("collection of string"));
        match shape.get("Author") {
            Some((_, FieldKind::Object { fields })) => {
                assert_eq!(fields.get("Born"), Some(("Born", &FieldKind::Date)));
            }
            other => panic!("Expected object field, got {:?}", other),
        }
    }

    #[test]
    fn test_load_shape_missing_file() {
        let result = Shape::from_json_file("non_existent_shape.json");
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_load_shape_invalid_json() {
        let file = write_temp(r#"{ "Title": { "type": "string" "#);
        assert!(matches!(Shape::from_json_file(file.path()), Err(ConfigError::Json { .. })));

        let file = write_temp(r#"{ "Title": { "type": "text" } }"#);
        assert!(matches!(Shape::from_json_file(file.path()), Err(ConfigError::Json { .. })));
    }
}
