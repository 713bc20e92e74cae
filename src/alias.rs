//! Operator alias registry.
//!
//! Resolves the operator text found at the current scan position to a
//! canonical operator. Tokens are kept sorted by descending length so the
//! longest configured token always wins (`@@$` over `@`).

use std::collections::HashMap;

use crate::ast::{CompOp, LogicalOp};
use crate::config::{ComparisonAliases, ConfigError, LogicalAliases};

/// Characters that carry structure in the filter language and can't be part
/// of an operator token.
const RESERVED_CHARS: [char; 6] = ['"', '(', ')', '[', ']', ','];

/// Punctuation that may appear inside number and date literals. A logical
/// token follows a value, so it must not start or contain any of these.
const LITERAL_CHARS: [char; 4] = ['+', '-', ':', '.'];

/// A comparison operator matched at the start of some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorMatch {
    pub op: CompOp,
    /// Matched length in bytes, appendix included.
    pub len: usize,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone)]
pub struct AliasRegistry {
    comparisons: Vec<(String, CompOp)>,
    logicals: Vec<(String, LogicalOp)>,
    appendix: String,
}

impl AliasRegistry {
    pub fn new(
        comparison: &ComparisonAliases,
        logical: &LogicalAliases,
    ) -> Result<Self, ConfigError> {
        let comparisons: Vec<(String, CompOp)> = CompOp::ALL
            .iter()
            .map(|op| (comparison.token(*op).to_string(), *op))
            .collect();
        let logicals: Vec<(String, LogicalOp)> = [LogicalOp::And, LogicalOp::Or]
            .iter()
            .map(|op| (logical.token(*op).to_string(), *op))
            .collect();

        let mut seen: HashMap<String, String> = HashMap::new();
        let named = comparisons
            .iter()
            .map(|(token, op)| (token, op.name().to_string()))
            .chain(
                logicals
                    .iter()
                    .map(|(token, op)| (token, format!("{:?}", op))),
            );
        for (token, operator) in named {
            validate_token(token, &operator)?;
            if let Some(first) = seen.insert(token.to_ascii_lowercase(), operator.clone()) {
                return Err(ConfigError::DuplicateToken {
                    token: token.clone(),
                    first,
                    second: operator,
                });
            }
        }

        for (token, op) in &logicals {
            if let Some(found) = token.chars().find(|c| LITERAL_CHARS.contains(c)) {
                return Err(ConfigError::InvalidTokenChar {
                    operator: format!("{:?}", op),
                    token: token.clone(),
                    found,
                });
            }
        }

        let appendix = comparison.case_insensitive_appendix.clone();
        if appendix.is_empty() {
            return Err(ConfigError::EmptyAppendix);
        }
        validate_token(&appendix, "case-insensitive appendix")?;

        Ok(Self::from_parts(comparisons, logicals, appendix))
    }

    fn from_parts(
        mut comparisons: Vec<(String, CompOp)>,
        mut logicals: Vec<(String, LogicalOp)>,
        appendix: String,
    ) -> Self {
        // stable: equal lengths keep declaration order
        comparisons.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        logicals.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            comparisons,
            logicals,
            appendix,
        }
    }

    /// Match a comparison operator at the start of `text`.
    ///
    /// The longest token matching wins. Whatever follows it is then checked
    /// for the case-insensitive appendix with a plain prefix test, so with
    /// operator `@@$` and appendix `$` the input `@@$$` is a case-insensitive
    /// `@@$` while `@@$` alone is not. Word-like tokens must end on a word
    /// boundary.
    pub fn resolve_comparison(&self, text: &str) -> Option<OperatorMatch> {
        for (token, op) in &self.comparisons {
            if !starts_with_ignore_ascii_case(text, token) {
                continue;
            }
            let len = token.len();
            if starts_with_ignore_ascii_case(&text[len..], &self.appendix) {
                let full = len + self.appendix.len();
                if at_word_boundary(text, full) {
                    return Some(OperatorMatch {
                        op: *op,
                        len: full,
                        case_insensitive: true,
                    });
                }
            }
            if at_word_boundary(text, len) {
                return Some(OperatorMatch {
                    op: *op,
                    len,
                    case_insensitive: false,
                });
            }
        }
        None
    }

    /// Match a logical operator at the start of `text`. Returns the operator
    /// and the matched length in bytes.
    pub fn resolve_logical(&self, text: &str) -> Option<(LogicalOp, usize)> {
        self.logicals
            .iter()
            .find(|(token, _)| {
                starts_with_ignore_ascii_case(text, token) && at_word_boundary(text, token.len())
            })
            .map(|(token, op)| (*op, token.len()))
    }

    pub fn appendix(&self) -> &str {
        &self.appendix
    }

    /// The configured token for a comparison operator.
    pub fn comparison_token(&self, op: CompOp) -> &str {
        self.comparisons
            .iter()
            .find(|(_, candidate)| *candidate == op)
            .map(|(token, _)| token.as_str())
            .unwrap_or_else(|| op.default_token())
    }

    pub fn logical_token(&self, op: LogicalOp) -> &str {
        self.logicals
            .iter()
            .find(|(_, candidate)| *candidate == op)
            .map(|(token, _)| token.as_str())
            .unwrap_or_else(|| op.default_token())
    }

    pub fn comparison_count(&self) -> usize {
        self.comparisons.len()
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        let comparisons = CompOp::ALL
            .iter()
            .map(|op| (op.default_token().to_string(), *op))
            .collect();
        let logicals = [LogicalOp::And, LogicalOp::Or]
            .iter()
            .map(|op| (op.default_token().to_string(), *op))
            .collect();
        Self::from_parts(comparisons, logicals, "*".to_string())
    }
}

fn validate_token(token: &str, operator: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::EmptyToken {
            operator: operator.to_string(),
        });
    }
    if let Some(found) = token
        .chars()
        .find(|c| c.is_whitespace() || RESERVED_CHARS.contains(c))
    {
        return Err(ConfigError::InvalidTokenChar {
            operator: operator.to_string(),
            token: token.to_string(),
            found,
        });
    }
    Ok(())
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// ASCII case-insensitive `starts_with`. A match always ends on a char
/// boundary because non-ASCII bytes have to be identical.
fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// A match of `len` bytes must not split a word: `eq` matches `eq "x"` but
/// not `equal`.
fn at_word_boundary(text: &str, len: usize) -> bool {
    let last = text[..len].chars().next_back();
    let next = text[len..].chars().next();
    match (last, next) {
        (Some(last), Some(next)) => !(is_ident_char(last) && is_ident_char(next)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(f: impl FnOnce(&mut ComparisonAliases)) -> AliasRegistry {
        let mut aliases = ComparisonAliases::default();
        f(&mut aliases);
        AliasRegistry::new(&aliases, &LogicalAliases::default()).unwrap()
    }

    fn matched(op: CompOp, len: usize, case_insensitive: bool) -> Option<OperatorMatch> {
        Some(OperatorMatch {
            op,
            len,
            case_insensitive,
        })
    }

    #[test]
    fn test_default_tokens() {
        let registry = AliasRegistry::default();
        assert_eq!(registry.resolve_comparison("== 1"), matched(CompOp::Eq, 2, false));
        assert_eq!(registry.resolve_comparison(">= 1"), matched(CompOp::Gte, 2, false));
        assert_eq!(registry.resolve_comparison("> 1"), matched(CompOp::Gt, 1, false));
        assert_eq!(registry.resolve_comparison("@=* \"a\""), matched(CompOp::Contains, 3, true));
        assert_eq!(registry.resolve_comparison("!@= \"a\""), matched(CompOp::NotContains, 3, false));
        assert_eq!(registry.resolve_comparison("=_ \"a\""), matched(CompOp::EndsWith, 2, false));
        assert_eq!(registry.resolve_comparison("!=_ \"a\""), matched(CompOp::NotEndsWith, 3, false));
        assert_eq!(registry.resolve_comparison("!^^ [1]"), matched(CompOp::NotIn, 3, false));
        assert_eq!(registry.resolve_comparison("Title"), None);
    }

    #[test]
    fn test_longest_match_wins() {
        let registry = registry(|a| {
            a.equals_operator = "@".to_string();
            a.contains_operator = "@@$".to_string();
        });
        assert_eq!(registry.resolve_comparison("@@$ \"x\""), matched(CompOp::Contains, 3, false));
        assert_eq!(registry.resolve_comparison("@ \"x\""), matched(CompOp::Eq, 1, false));
    }

    #[test]
    fn test_appendix_after_symbol_alias() {
        let registry = registry(|a| {
            a.equals_operator = "@@$".to_string();
            a.case_insensitive_appendix = "~".to_string();
        });
        assert_eq!(registry.resolve_comparison("@@$~ \"x\""), matched(CompOp::Eq, 4, true));
        assert_eq!(registry.resolve_comparison("@@$ \"x\""), matched(CompOp::Eq, 3, false));
    }

    #[test]
    fn test_appendix_overlapping_operator_chars() {
        let registry = registry(|a| {
            a.equals_operator = "@@$".to_string();
            a.case_insensitive_appendix = "$".to_string();
        });
        assert_eq!(registry.resolve_comparison("@@$$ \"x\""), matched(CompOp::Eq, 4, true));
        assert_eq!(registry.resolve_comparison("@@$ \"x\""), matched(CompOp::Eq, 3, false));
    }

    #[test]
    fn test_word_alias_with_letter_appendix() {
        let registry = registry(|a| {
            a.equals_operator = "eq".to_string();
            a.case_insensitive_appendix = "t".to_string();
        });
        assert_eq!(registry.resolve_comparison("eqt \"x\""), matched(CompOp::Eq, 3, true));
        assert_eq!(registry.resolve_comparison("eq \"x\""), matched(CompOp::Eq, 2, false));
        assert_eq!(registry.resolve_comparison("eqx \"x\""), None);
    }

    #[test]
    fn test_word_alias_matches_any_ascii_case() {
        let registry = registry(|a| a.equals_operator = "ti".to_string());
        assert_eq!(registry.resolve_comparison("Ti \"x\""), matched(CompOp::Eq, 2, false));
        assert_eq!(registry.resolve_comparison("TI\"x\""), matched(CompOp::Eq, 2, false));
        assert_eq!(registry.resolve_comparison("title"), None);
    }

    #[test]
    fn test_word_aliases_prefer_longer_token() {
        let registry = registry(|a| {
            a.greater_than_operator = "gt".to_string();
            a.greater_than_or_equal_operator = "gte".to_string();
        });
        assert_eq!(registry.resolve_comparison("gte 1"), matched(CompOp::Gte, 3, false));
        assert_eq!(registry.resolve_comparison("gt 1"), matched(CompOp::Gt, 2, false));
    }

    #[test]
    fn test_logical_operators() {
        let registry = AliasRegistry::new(
            &ComparisonAliases::default(),
            &LogicalAliases {
                and_operator: "and".to_string(),
                or_operator: "||".to_string(),
            },
        )
        .unwrap();
        assert_eq!(registry.resolve_logical("AND x"), Some((LogicalOp::And, 3)));
        assert_eq!(registry.resolve_logical("|| x"), Some((LogicalOp::Or, 2)));
        assert_eq!(registry.resolve_logical("andy"), None);
        assert_eq!(registry.resolve_logical("&&"), None);
        assert_eq!(registry.logical_token(LogicalOp::And), "and");
    }

    #[test]
    fn test_logical_tokens_ignore_appendix() {
        let registry = AliasRegistry::default();
        assert_eq!(registry.resolve_logical("&&* x"), Some((LogicalOp::And, 2)));
    }

    #[test]
    fn test_rejects_reserved_characters() {
        let mut aliases = ComparisonAliases::default();
        aliases.in_operator = "in(".to_string();
        let result = AliasRegistry::new(&aliases, &LogicalAliases::default());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTokenChar { found: '(', .. })
        ));
    }

    #[test]
    fn test_logical_tokens_reject_literal_punctuation() {
        for (token, expected) in [("-", '-'), ("+", '+'), ("and.", '.'), ("::", ':')] {
            let logical = LogicalAliases {
                and_operator: token.to_string(),
                ..LogicalAliases::default()
            };
            let result = AliasRegistry::new(&ComparisonAliases::default(), &logical);
            assert!(
                matches!(result, Err(ConfigError::InvalidTokenChar { found, .. }) if found == expected),
                "{token}"
            );
        }

        // comparison tokens may still use them
        let registry = registry(|a| a.greater_than_operator = "->".to_string());
        assert_eq!(registry.resolve_comparison("-> 5"), matched(CompOp::Gt, 2, false));
    }

    #[test]
    fn test_configured_tokens_by_operator() {
        let registry = registry(|a| {
            a.equals_operator = "eq".to_string();
            a.not_in_operator = "nin".to_string();
        });
        assert_eq!(registry.comparison_token(CompOp::Eq), "eq");
        assert_eq!(registry.comparison_token(CompOp::NotIn), "nin");
        assert_eq!(registry.comparison_token(CompOp::Gte), ">=");
        assert_eq!(registry.logical_token(LogicalOp::Or), "||");
        assert_eq!(registry.comparison_count(), CompOp::ALL.len());
    }

    #[test]
    fn test_rejects_token_shared_with_logical_operator() {
        let mut aliases = ComparisonAliases::default();
        aliases.equals_operator = "&&".to_string();
        let result = AliasRegistry::new(&aliases, &LogicalAliases::default());
        assert!(matches!(result, Err(ConfigError::DuplicateToken { .. })));
    }
}
