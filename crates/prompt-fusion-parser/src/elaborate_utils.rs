//! Field inspection utilities for the elaboration phase.
//!
//! Elaboration classifies a group by looking at the text of its fields:
//! whether a field is numeric, a comma-separated boundary list, a curve
//! name, or contains option pipes. These helpers answer those questions
//! without elaborating the field.

use crate::{
    error::{Diagnostic, ErrorCode, Result as DiagnosticResult},
    parser_types::Node,
    span::Span,
    tokens::Token,
};

/// A borrowed view of one field of a group.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'f, 'src> {
    nodes: &'f [Node<'src>],
}

impl<'f, 'src> FieldView<'f, 'src> {
    pub fn new(nodes: &'f [Node<'src>]) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &'f [Node<'src>] {
        self.nodes
    }

    /// Span from the first to the last node, if the field has any.
    pub fn span(&self) -> Option<Span> {
        let first = self.nodes.first()?.span();
        let last = self.nodes.last()?.span();
        Some(first.union(last))
    }

    /// Span of the field, or an empty span at `fallback` for an empty field.
    pub fn span_or(&self, fallback: usize) -> Span {
        self.span().unwrap_or(Span::new(fallback..fallback))
    }

    /// The field's source text if it holds no nested group.
    pub fn plain_text(&self) -> Option<String> {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Leaf(token) => Some(token.to_string()),
                Node::Group(_) => None,
            })
            .collect()
    }

    /// The trimmed source text if the field holds no nested group.
    pub fn trimmed_text(&self) -> Option<String> {
        self.plain_text().map(|text| text.trim().to_string())
    }

    /// Whether `token` occurs in the field outside any nested group.
    pub fn contains(&self, token: &Token<'_>) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node, Node::Leaf(leaf) if leaf.token == *token))
    }

    /// Split the field at every top-level occurrence of `separator`.
    pub fn split(&self, separator: &Token<'_>) -> Vec<FieldView<'f, 'src>> {
        self.nodes
            .split(|node| matches!(node, Node::Leaf(leaf) if leaf.token == *separator))
            .map(FieldView::new)
            .collect()
    }

    /// The trimmed entries of a boundary list.
    ///
    /// A boundary list is plain text whose comma-separated entries are each
    /// empty or numeric. A blank field is a boundary list with one empty
    /// entry.
    pub fn boundary_entries(&self) -> Option<Vec<String>> {
        let text = self.plain_text()?;
        let entries: Vec<String> = text.split(',').map(|e| e.trim().to_string()).collect();
        entries
            .iter()
            .all(|entry| entry.is_empty() || looks_numeric(entry))
            .then_some(entries)
    }
}

/// Whether `text` is meant as a number.
///
/// Numeric text has at least one digit, uses only `0-9 . + - e E`, and
/// starts with a digit, a sign or a dot. Such text that still fails to
/// parse is an error rather than prompt text.
pub fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));

    starts_well
        && text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
}

/// Parses numeric field text into a finite number.
pub struct NumberExtractor;

impl NumberExtractor {
    /// Parse `text`, reporting failures at `span`.
    pub fn extract(text: &str, span: Span) -> DiagnosticResult<f64> {
        let text = text.trim();
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(Diagnostic::error(format!("invalid number `{text}`"))
                .with_code(ErrorCode::E102)
                .with_label(span, "not a finite number")
                .with_help("write a decimal number such as `1.5`, `-2` or `.25`")),
        }
    }

    /// Parse boundary entries into positions, `None` for elided entries.
    pub fn extract_positions(
        entries: &[String],
        keyframes: usize,
        span: Span,
    ) -> DiagnosticResult<Vec<Option<f64>>> {
        if entries.iter().all(String::is_empty) {
            return Ok(vec![None; keyframes]);
        }
        if entries.len() != keyframes {
            return Err(Diagnostic::error(format!(
                "expected {keyframes} boundaries, found {}",
                entries.len()
            ))
            .with_code(ErrorCode::E104)
            .with_label(span, "one boundary per keyframe")
            .with_help("give every keyframe a position, or leave them all empty: `[a:b:c:,,]`"));
        }

        entries
            .iter()
            .map(|entry| {
                if entry.is_empty() {
                    Ok(None)
                } else {
                    Self::extract(entry, span).map(Some)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::build_tree};

    #[test]
    fn test_looks_numeric() {
        for text in ["1", "-2.1", ".25", "5.", "1e5", "+3", "1.2.3", "1e"] {
            assert!(looks_numeric(text), "{text}");
        }
        for text in ["", "-", "abc", "1girl", "e5", "1,2", " 1"] {
            assert!(!looks_numeric(text), "{text}");
        }
    }

    #[test]
    fn test_number_extractor() {
        let span = Span::new(0..3);
        assert_eq!(NumberExtractor::extract("1.5", span).unwrap(), 1.5);
        assert_eq!(NumberExtractor::extract(" .25 ", span).unwrap(), 0.25);

        let err = NumberExtractor::extract("1.2.3", span).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_extract_positions() {
        let span = Span::new(0..1);
        let entries = |list: &[&str]| list.iter().map(|e| e.to_string()).collect::<Vec<_>>();

        assert_eq!(
            NumberExtractor::extract_positions(&entries(&["", ""]), 3, span).unwrap(),
            vec![None, None, None]
        );
        assert_eq!(
            NumberExtractor::extract_positions(&entries(&["", ".5", ""]), 3, span).unwrap(),
            vec![None, Some(0.5), None]
        );

        let err = NumberExtractor::extract_positions(&entries(&["1", "2"]), 3, span).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E104));
    }

    #[test]
    fn test_field_view() {
        let tokens = tokenize("[a|b c: 1, 2 ]");
        let tree = build_tree(&tokens).unwrap();
        let Node::Group(group) = &tree[0] else {
            panic!("expected group");
        };

        let first = FieldView::new(&group.fields[0]);
        assert!(first.contains(&Token::Pipe));
        assert_eq!(first.split(&Token::Pipe).len(), 2);
        assert_eq!(first.plain_text().as_deref(), Some("a|b c"));

        let second = FieldView::new(&group.fields[1]);
        assert_eq!(
            second.boundary_entries(),
            Some(vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(second.span(), Some(Span::new(7..13)));
    }
}
