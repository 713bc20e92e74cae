//! Field path resolution against a [`Shape`].

use crate::compiler::CompileError;
use crate::shape::{FieldKind, Shape, ValueKind};
use crate::token::Span;

/// One step of a resolved field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Field name as declared in the shape.
    pub name: String,
    /// Number of collection levels this field wraps its value in.
    /// `0` for a plain field, `1` for a list, `2` for a list of lists.
    pub collection_depth: usize,
}

/// A field path resolved down to a comparable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub segments: Vec<Segment>,
    pub kind: ValueKind,
    /// Declared variants when `kind` is [`ValueKind::Enum`].
    pub variants: Vec<String>,
}

impl ResolvedField {
    pub fn crosses_collection(&self) -> bool {
        self.segments.iter().any(|s| s.collection_depth > 0)
    }

    /// Indices of the segments that are collections.
    pub fn collection_boundaries(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.collection_depth > 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Canonical dotted path.
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    case_sensitive: bool,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FieldResolver {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    fn lookup<'s>(&self, shape: &'s Shape, name: &str) -> Option<(&'s str, &'s FieldKind)> {
        if self.case_sensitive {
            shape.get(name)
        } else {
            shape.get_ignore_case(name)
        }
    }

    /// Walk `path` segment by segment. Collections are transparent: the walk
    /// continues into the element kind and the segment is marked as a
    /// collection boundary.
    pub fn resolve(&self, path: &str, span: Span, shape: &Shape) -> Result<ResolvedField, CompileError> {
        let unknown = || CompileError::UnknownField {
            path: path.to_string(),
            span,
        };

        let parts: Vec<&str> = path.split('.').collect();
        let mut current = shape;
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let (name, declared) = self.lookup(current, part).ok_or_else(unknown)?;

            let mut kind = declared;
            let mut collection_depth = 0;
            while let FieldKind::Collection { of } = kind {
                collection_depth += 1;
                kind = of.as_ref();
            }
            segments.push(Segment {
                name: name.to_string(),
                collection_depth,
            });

            let last = i + 1 == parts.len();
            match kind {
                FieldKind::Object { fields } if !last => current = fields,
                FieldKind::Object { .. } => {
                    return Err(CompileError::NotComparable {
                        path: path.to_string(),
                        kind: declared.describe(),
                        span,
                    });
                }
                // a scalar can't have sub-fields
                _ if !last => return Err(unknown()),
                scalar => {
                    let variants = match scalar {
                        FieldKind::Enum { variants } => variants.clone(),
                        _ => Vec::new(),
                    };
                    let kind = scalar.value_kind().ok_or_else(unknown)?;
                    return Ok(ResolvedField {
                        segments,
                        kind,
                        variants,
                    });
                }
            }
        }

        Err(unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_shape() -> Shape {
        let preparation = Shape::new().field("Text", FieldKind::String);
        let ingredient = Shape::new()
            .field("Name", FieldKind::String)
            .field("Quantity", FieldKind::Number)
            .field(
                "Preparations",
                FieldKind::collection(FieldKind::object(preparation)),
            );
        let author = Shape::new().field("Name", FieldKind::String);

        Shape::new()
            .field("Title", FieldKind::String)
            .field("Rating", FieldKind::Number)
            .field("Visibility", FieldKind::enumeration(["Public", "Private"]))
            .field("Tags", FieldKind::collection(FieldKind::String))
            .field("Author", FieldKind::object(author))
            .field("Ingredients", FieldKind::collection(FieldKind::object(ingredient)))
    }

    fn resolve(path: &str) -> Result<ResolvedField, CompileError> {
        FieldResolver::default().resolve(path, Span::default(), &recipe_shape())
    }

    #[test]
    fn test_plain_field() {
        let field = resolve("Rating").unwrap();
        assert_eq!(field.kind, ValueKind::Number);
        assert_eq!(field.path(), "Rating");
        assert!(!field.crosses_collection());
    }

    #[test]
    fn test_nested_object_field() {
        let field = resolve("Author.Name").unwrap();
        assert_eq!(field.kind, ValueKind::String);
        assert_eq!(field.segments.len(), 2);
        assert!(field.collection_boundaries().is_empty());
    }

    #[test]
    fn test_collection_boundaries() {
        let field = resolve("Ingredients.Preparations.Text").unwrap();
        assert_eq!(field.kind, ValueKind::String);
        assert_eq!(field.collection_boundaries(), vec![0, 1]);

        let field = resolve("Tags").unwrap();
        assert_eq!(field.collection_boundaries(), vec![0]);
        assert_eq!(field.segments[0].collection_depth, 1);
    }

    #[test]
    fn test_enum_variants_are_carried() {
        let field = resolve("Visibility").unwrap();
        assert_eq!(field.kind, ValueKind::Enum);
        assert_eq!(field.variants, vec!["Public".to_string(), "Private".to_string()]);
    }

    #[test]
    fn test_unknown_fields() {
        for path in ["Missing", "Author.Missing", "Title.Length", "title"] {
            let err = resolve(path).unwrap_err();
            assert!(
                matches!(&err, CompileError::UnknownField { path: p, .. } if p == path),
                "{path}: {err:?}"
            );
        }
    }

    #[test]
    fn test_object_is_not_comparable() {
        let err = resolve("Ingredients").unwrap_err();
        assert!(matches!(
            err,
            CompileError::NotComparable { ref kind, .. } if kind == "collection of object"
        ));
    }

    #[test]
    fn test_case_insensitive_resolution() {
        let resolver = FieldResolver::new(false);
        let field = resolver
            .resolve("ingredients.NAME", Span::default(), &recipe_shape())
            .unwrap();
        assert_eq!(field.path(), "Ingredients.Name");
    }
}
