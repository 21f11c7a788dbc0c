//! Elaboration phase for the prompt bracket tree
//!
//! This module classifies every group of the bracket tree produced by the
//! [`parser`](super::parser) and builds the [`Expression`] consumed by the
//! scheduler. Leaf runs become whitespace-normalized literals; groups become
//! attention, step switches, alternations, curve interpolations, or
//! passthrough groups for everything the host grammar handles itself.

use log::{debug, trace};

use prompt_fusion_core::{
    curve::Curve,
    expression::{
        Alternation, CurveInterpolation, Delimiter, Expression, ExpressionError, StepBoundary,
    },
};

use crate::{
    elaborate_utils::{FieldView, NumberExtractor, looks_numeric},
    error::{Diagnostic, ErrorCode, Result},
    parser_types::{Field, Group, Node},
    span::Span,
    tokens::{PositionedToken, Token},
};

#[derive(Debug, Default)]
pub struct Builder {
    groups: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Main Entry Methods
    // ============================================================================

    pub fn build(mut self, tree: &[Node<'_>]) -> Result<Expression> {
        debug!(nodes = tree.len(); "Elaborating bracket tree");
        let expression = self.build_field(tree)?;
        debug!(groups = self.groups; "Elaboration completed");
        trace!("Elaborated expression:\n{expression}");
        Ok(expression)
    }

    /// Build the expression of a run of nodes.
    ///
    /// Consecutive leaves form one literal. A run with a single child is
    /// that child; an empty run is the empty literal.
    fn build_field(&mut self, nodes: &[Node<'_>]) -> Result<Expression> {
        let mut children = Vec::new();
        let mut text = String::new();

        for node in nodes {
            match node {
                Node::Leaf(token) => text.push_str(&token.to_string()),
                Node::Group(group) => {
                    Self::flush_text(&mut text, &mut children);
                    children.push(self.build_group(group)?);
                }
            }
        }
        Self::flush_text(&mut text, &mut children);

        Ok(sequence(children))
    }

    fn flush_text(text: &mut String, children: &mut Vec<Expression>) {
        let collapsed = collapse_whitespace(text);
        if !collapsed.is_empty() {
            children.push(Expression::Literal(collapsed));
        }
        text.clear();
    }

    fn build_fields(&mut self, fields: &[Field<'_>]) -> Result<Vec<Expression>> {
        fields.iter().map(|field| self.build_field(field)).collect()
    }

    fn build_options(&mut self, field: FieldView<'_, '_>) -> Result<Vec<Expression>> {
        field
            .split(&Token::Pipe)
            .into_iter()
            .map(|option| self.build_field(option.nodes()))
            .collect()
    }

    fn build_group(&mut self, group: &Group<'_>) -> Result<Expression> {
        self.groups += 1;
        trace!(
            delimiter:? = group.delimiter,
            fields = group.fields.len();
            "Classifying group",
        );
        match group.delimiter {
            Delimiter::Paren => self.build_paren(group),
            Delimiter::Bracket => self.build_bracket(group),
        }
    }

    // ============================================================================
    // Paren Groups
    // ============================================================================

    fn build_paren(&mut self, group: &Group<'_>) -> Result<Expression> {
        let k = group.fields.len() - 1;
        if k == 0 {
            return self.passthrough(group, Delimiter::Paren);
        }

        let last = field_view(group, k);
        let Some(text) = last.trimmed_text() else {
            return self.passthrough(group, Delimiter::Paren);
        };
        let span = field_span(group, k);

        if looks_numeric(&text) {
            let weight = NumberExtractor::extract(&text, span)?;
            let child = self.build_field(&rejoin(group, k))?;
            debug!(weight; "Static attention");
            return Ok(Expression::AttentionStatic {
                child: Box::new(child),
                weight,
            });
        }

        let entries: Vec<&str> = text.split(',').map(str::trim).collect();
        if let [start, end] = entries.as_slice()
            && looks_numeric(start)
            && looks_numeric(end)
        {
            let start = NumberExtractor::extract(start, span)?;
            let end = NumberExtractor::extract(end, span)?;
            let child = self.build_field(&rejoin(group, k))?;
            debug!(start, end; "Interpolated attention");
            return Ok(Expression::AttentionInterpolated {
                child: Box::new(child),
                start,
                end,
            });
        }

        self.passthrough(group, Delimiter::Paren)
    }

    // ============================================================================
    // Bracket Groups
    // ============================================================================

    fn build_bracket(&mut self, group: &Group<'_>) -> Result<Expression> {
        let k = group.fields.len() - 1;
        let first = field_view(group, 0);

        if k == 0 {
            if first.contains(&Token::Pipe) {
                return self.pipe_group(first);
            }
            return self.passthrough(group, Delimiter::Bracket);
        }

        let last = field_view(group, k);
        let last_text = last.trimmed_text();

        // `[a:b:c:p1,p2,p3:curve]`
        if k >= 3
            && let Some(curve) = last_text.as_deref().and_then(|t| t.parse::<Curve>().ok())
            && let Some(entries) = field_view(group, k - 1).boundary_entries()
        {
            return self.curve_interpolation(group, k - 1, &entries, curve);
        }

        if k >= 3
            && let Some(word) = last_text.as_deref()
            && !word.is_empty()
            && word.chars().all(char::is_alphabetic)
            && field_view(group, k - 1).boundary_entries().is_some()
        {
            return Err(Diagnostic::error(format!("unknown curve `{word}`"))
                .with_code(ErrorCode::E103)
                .with_label(field_span(group, k), "not a curve")
                .with_help("use one of `linear`, `bezier`, `catmull` or `mean`"));
        }

        // `[a:b:c:p1,p2,p3]`
        if k >= 2
            && let Some(entries) = last.boundary_entries()
            && entries.len() > 1
        {
            return self.curve_interpolation(group, k, &entries, Curve::Linear);
        }

        if k == 1 && first.contains(&Token::Pipe) {
            match last_text.as_deref() {
                Some("") => return self.pipe_group(first),
                Some(text) if looks_numeric(text) => {
                    let period = NumberExtractor::extract(text, field_span(group, 1))?;
                    let options = self.build_options(first)?;
                    debug!(options = options.len(), period; "Alternation");
                    let alternation = Alternation::new(options, period)
                        .map_err(|err| invalid_node(err, group.span()))?;
                    return Ok(Expression::Alternation(alternation));
                }
                _ => {}
            }
        }

        // `[from:to:N]`, `[to:N]`
        if k <= 2
            && let Some(text) = last_text.as_deref()
            && (text.is_empty() || looks_numeric(text))
        {
            let boundary = if text.is_empty() {
                None
            } else {
                let value = NumberExtractor::extract(text, field_span(group, k))?;
                Some(StepBoundary::new(value, text))
            };
            let from = if k == 2 {
                Some(Box::new(self.build_field(&group.fields[0])?))
            } else {
                None
            };
            let to = self.build_field(&group.fields[k - 1])?;
            debug!(boundary = text; "Step switch");
            return Ok(Expression::StepSwitch {
                from,
                to: Box::new(to),
                boundary,
            });
        }

        self.passthrough(group, Delimiter::Bracket)
    }

    /// Keyframes are the first `count` fields; `entries` is the boundary list.
    fn curve_interpolation(
        &mut self,
        group: &Group<'_>,
        count: usize,
        entries: &[String],
        curve: Curve,
    ) -> Result<Expression> {
        let positions =
            NumberExtractor::extract_positions(entries, count, field_span(group, count))?;
        let keyframes = self.build_fields(&group.fields[..count])?;
        debug!(keyframes = keyframes.len(), curve:%; "Curve interpolation");
        let interpolation = CurveInterpolation::new(keyframes, positions, curve)
            .map_err(|err| invalid_node(err, group.span()))?;
        Ok(Expression::CurveInterpolation(interpolation))
    }

    /// `[a|b|c]`, left for the host.
    fn pipe_group(&mut self, options: FieldView<'_, '_>) -> Result<Expression> {
        Ok(Expression::Group {
            delimiter: Delimiter::Bracket,
            separator: '|',
            fields: self.build_options(options)?,
        })
    }

    fn passthrough(&mut self, group: &Group<'_>, delimiter: Delimiter) -> Result<Expression> {
        Ok(Expression::Group {
            delimiter,
            separator: ':',
            fields: self.build_fields(&group.fields)?,
        })
    }
}

fn sequence(mut children: Vec<Expression>) -> Expression {
    match children.len() {
        0 => Expression::literal(""),
        1 => children.remove(0),
        _ => Expression::Sequence(children),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn field_view<'f, 'src>(group: &'f Group<'src>, index: usize) -> FieldView<'f, 'src> {
    FieldView::new(&group.fields[index])
}

/// Span of a field, or the point after its separator if it is empty.
fn field_span(group: &Group<'_>, index: usize) -> Span {
    let fallback = match index {
        0 => group.open.end(),
        _ => group.separators[index - 1].end(),
    };
    field_view(group, index).span_or(fallback)
}

/// The first `count` fields joined back together with their colons.
fn rejoin<'src>(group: &Group<'src>, count: usize) -> Vec<Node<'src>> {
    let mut nodes = Vec::new();
    for (index, field) in group.fields[..count].iter().enumerate() {
        if index > 0 {
            let colon = PositionedToken::new(Token::Colon, group.separators[index - 1]);
            nodes.push(Node::Leaf(colon));
        }
        nodes.extend(field.iter().cloned());
    }
    nodes
}

fn invalid_node(err: ExpressionError, span: Span) -> Diagnostic {
    Diagnostic::error(err.to_string())
        .with_code(ErrorCode::E104)
        .with_label(span, "in this group")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::build_tree};

    fn elaborate(source: &str) -> Result<Expression> {
        let tokens = tokenize(source);
        let tree = build_tree(&tokens)?;
        Builder::new().build(&tree)
    }

    #[test]
    fn test_collapses_whitespace() {
        let expression = elaborate("  a   lot\n of\tanimals ").unwrap();
        assert_eq!(expression, Expression::literal("a lot of animals"));
    }

    #[test]
    fn test_empty_prompt() {
        assert_eq!(elaborate("").unwrap(), Expression::literal(""));
        assert_eq!(elaborate("  ").unwrap(), Expression::literal(""));
    }

    #[test]
    fn test_attention_child_keeps_inner_colons() {
        let expression = elaborate("(a:b:1.5)").unwrap();
        assert_eq!(
            expression,
            Expression::AttentionStatic {
                child: Box::new(Expression::literal("a:b")),
                weight: 1.5,
            }
        );
    }

    #[test]
    fn test_bracket_curve_detection_order() {
        let Expression::CurveInterpolation(interpolation) = elaborate("[a:b:c::mean]").unwrap()
        else {
            panic!("expected curve interpolation");
        };
        assert_eq!(interpolation.keyframes().len(), 3);
        assert_eq!(interpolation.curve(), Curve::Mean);
        assert!(interpolation.positions().iter().all(Option::is_none));
    }

    #[test]
    fn test_non_numeric_switch_is_passthrough() {
        let expression = elaborate("[abc:def]").unwrap();
        assert!(matches!(
            expression,
            Expression::Group {
                delimiter: Delimiter::Bracket,
                separator: ':',
                ..
            }
        ));
    }

    #[test]
    fn test_group_count() {
        let tokens = tokenize("[a:(b:1.1):2] (c) [d|e]");
        let tree = build_tree(&tokens).unwrap();
        let mut builder = Builder::new();
        builder.build_field(&tree).unwrap();
        assert_eq!(builder.groups, 4);
    }
}
