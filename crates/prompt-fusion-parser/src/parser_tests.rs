//! Unit tests for the full parsing pipeline
//!
//! These tests run prompts through tokenization, tree building and
//! elaboration, and check the classification of every construct of the
//! prompt language together with its error reporting.

use prompt_fusion_core::{
    curve::Curve,
    expression::{Delimiter, Expression},
};

use crate::{
    elaborate::Builder,
    error::{ErrorCode, ParseError},
    lexer, parser, variables,
};

/// Helper function to run a prompt through the whole pipeline
fn parse_source(source: &str) -> Result<Expression, ParseError> {
    let resolved = variables::resolve(source)?;
    let tokens = lexer::tokenize(&resolved);
    let tree = parser::build_tree(&tokens)?;
    Ok(Builder::new().build(&tree)?)
}

/// Helper function to parse a prompt and assert success
fn parse_ok(source: &str) -> Expression {
    match parse_source(source) {
        Ok(expression) => expression,
        Err(e) => panic!("Expected parsing of {source:?} to succeed, but got error: {e}"),
    }
}

/// Helper function to parse a prompt and assert it fails with `code`
fn assert_parse_fails_with(source: &str, code: ErrorCode) {
    match parse_source(source) {
        Ok(expression) => panic!("Expected parsing of {source:?} to fail, got:\n{expression}"),
        Err(e) => assert_eq!(
            e.diagnostics()[0].code(),
            Some(code),
            "unexpected error for {source:?}: {e}"
        ),
    }
}

fn lit(text: &str) -> Expression {
    Expression::literal(text)
}

#[cfg(test)]
mod literal_tests {
    use super::*;

    #[test]
    fn test_plain_prompt() {
        assert_eq!(parse_ok("a red   cat"), lit("a red cat"));
    }

    #[test]
    fn test_top_level_colon_is_text() {
        assert_eq!(parse_ok("style: oil"), lit("style: oil"));
    }

    #[test]
    fn test_escaped_delimiters_are_verbatim() {
        assert_eq!(
            parse_ok(r"portrait \(object\)"),
            lit(r"portrait \(object\)")
        );
    }

    #[test]
    fn test_sequence_around_group() {
        let expression = parse_ok("legacy [from:to:2] thingy");
        let Expression::Sequence(children) = expression else {
            panic!("expected sequence");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], lit("legacy"));
        assert!(matches!(children[1], Expression::StepSwitch { .. }));
        assert_eq!(children[2], lit("thingy"));
    }
}

#[cfg(test)]
mod attention_tests {
    use super::*;

    #[test]
    fn test_static_attention() {
        assert_eq!(
            parse_ok("(cat:1.5)"),
            Expression::AttentionStatic {
                child: Box::new(lit("cat")),
                weight: 1.5,
            }
        );
    }

    #[test]
    fn test_interpolated_attention() {
        assert_eq!(
            parse_ok("(cats:0.5, 1.5)"),
            Expression::AttentionInterpolated {
                child: Box::new(lit("cats")),
                start: 0.5,
                end: 1.5,
            }
        );
    }

    #[test]
    fn test_nested_attention_child() {
        let expression = parse_ok("((a:1.1) b:0.9)");
        let Expression::AttentionStatic { child, weight } = expression else {
            panic!("expected attention");
        };
        assert_eq!(weight, 0.9);
        assert!(matches!(*child, Expression::Sequence(ref c) if c.len() == 2));
    }

    #[test]
    fn test_plain_paren_is_passthrough() {
        assert_eq!(
            parse_ok("(positive weight)"),
            Expression::Group {
                delimiter: Delimiter::Paren,
                separator: ':',
                fields: vec![lit("positive weight")],
            }
        );
    }

    #[test]
    fn test_three_weights_is_passthrough() {
        assert!(matches!(
            parse_ok("(a:1,2,3)"),
            Expression::Group {
                delimiter: Delimiter::Paren,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_weight() {
        assert_parse_fails_with("(a:1.2.3)", ErrorCode::E102);
        assert_parse_fails_with("(a:1,2e)", ErrorCode::E102);
    }
}

#[cfg(test)]
mod step_switch_tests {
    use super::*;

    fn boundary_text(expression: &Expression) -> Option<String> {
        match expression {
            Expression::StepSwitch { boundary, .. } => {
                boundary.as_ref().map(|b| b.text().to_string())
            }
            other => panic!("expected step switch, got:\n{other}"),
        }
    }

    #[test]
    fn test_three_field_switch() {
        let expression = parse_ok("[from:to:2]");
        assert_eq!(boundary_text(&expression).as_deref(), Some("2"));
        let Expression::StepSwitch { from, to, .. } = expression else {
            unreachable!();
        };
        assert_eq!(from.as_deref(), Some(&lit("from")));
        assert_eq!(*to, lit("to"));
    }

    #[test]
    fn test_two_field_switch() {
        let expression = parse_ok("[to:0.25]");
        assert_eq!(boundary_text(&expression).as_deref(), Some("0.25"));
        assert!(matches!(expression, Expression::StepSwitch { from: None, .. }));
    }

    #[test]
    fn test_empty_boundary() {
        assert_eq!(boundary_text(&parse_ok("[a:b:]")), None);
        assert_eq!(boundary_text(&parse_ok("[::]")), None);
    }

    #[test]
    fn test_nested_switch() {
        let expression = parse_ok("[[(weight interpolation:0,12):0]::3]");
        let Expression::StepSwitch { from, to, boundary } = expression else {
            panic!("expected step switch");
        };
        assert_eq!(boundary.map(|b| b.value()), Some(3.0));
        assert!(to.is_empty_literal());
        let inner = from.expect("outer switch has a from branch");
        assert_eq!(boundary_text(&inner).as_deref(), Some("0"));
    }

    #[test]
    fn test_non_numeric_step_is_passthrough() {
        assert_eq!(
            parse_ok("[abc:def]"),
            Expression::Group {
                delimiter: Delimiter::Bracket,
                separator: ':',
                fields: vec![lit("abc"), lit("def")],
            }
        );
    }

    #[test]
    fn test_invalid_step() {
        assert_parse_fails_with("[a:b:1.2.3]", ErrorCode::E102);
    }
}

#[cfg(test)]
mod alternation_tests {
    use super::*;

    #[test]
    fn test_alternation() {
        let Expression::Alternation(alternation) = parse_ok("[a|b|c:2]") else {
            panic!("expected alternation");
        };
        assert_eq!(alternation.options(), &[lit("a"), lit("b"), lit("c")]);
        assert_eq!(alternation.period(), 2.0);
    }

    #[test]
    fn test_short_period_is_clamped() {
        let Expression::Alternation(alternation) = parse_ok("[a|b|c:0.5]") else {
            panic!("expected alternation");
        };
        assert_eq!(alternation.period(), 1.0);
    }

    #[test]
    fn test_options_are_elaborated() {
        let Expression::Alternation(alternation) = parse_ok("[a|[b:c:1]:1]") else {
            panic!("expected alternation");
        };
        assert!(matches!(
            alternation.options()[1],
            Expression::StepSwitch { .. }
        ));
    }

    #[test]
    fn test_without_period_is_pipe_group() {
        let expected = Expression::Group {
            delimiter: Delimiter::Bracket,
            separator: '|',
            fields: vec![lit("a"), lit("b"), lit("c")],
        };
        assert_eq!(parse_ok("[a|b|c]"), expected);
        assert_eq!(parse_ok("[a|b|c:]"), expected);
    }
}

#[cfg(test)]
mod curve_tests {
    use super::*;

    fn curve_of(source: &str) -> (usize, Vec<Option<f64>>, Curve) {
        match parse_ok(source) {
            Expression::CurveInterpolation(interpolation) => (
                interpolation.keyframes().len(),
                interpolation.positions().to_vec(),
                interpolation.curve(),
            ),
            other => panic!("expected curve interpolation, got:\n{other}"),
        }
    }

    #[test]
    fn test_comma_list_defaults_to_linear() {
        assert_eq!(curve_of("[b:c:,]"), (2, vec![None, None], Curve::Linear));
    }

    #[test]
    fn test_pinned_positions() {
        assert_eq!(
            curve_of("[a:b:c:1,3,5]"),
            (3, vec![Some(1.0), Some(3.0), Some(5.0)], Curve::Linear)
        );
        assert_eq!(
            curve_of("[a:b:c:,.5,]"),
            (3, vec![None, Some(0.5), None], Curve::Linear)
        );
    }

    #[test]
    fn test_named_curve() {
        assert_eq!(
            curve_of("[top level:interpolatin:lik a pro:1,3,5:linear]"),
            (3, vec![Some(1.0), Some(3.0), Some(5.0)], Curve::Linear)
        );
        assert_eq!(
            curve_of("[a:b:c::mean]"),
            (3, vec![None, None, None], Curve::Mean)
        );
        assert_eq!(
            curve_of("[a:b:,:Catmull]"),
            (2, vec![None, None], Curve::Catmull)
        );
    }

    #[test]
    fn test_unknown_curve() {
        assert_parse_fails_with("[a:b:c:1,2,3:cubic]", ErrorCode::E103);
        assert_parse_fails_with("[a:b:c::meen]", ErrorCode::E103);
        assert_parse_fails_with("[a:b:c:5,6,7:meen]", ErrorCode::E103);
        assert_parse_fails_with("[a:b:c:5:meen]", ErrorCode::E103);
    }

    #[test]
    fn test_boundary_count_mismatch() {
        assert_parse_fails_with("[a:b:1,2,3]", ErrorCode::E104);
    }

    #[test]
    fn test_four_plain_fields_is_passthrough() {
        assert!(matches!(parse_ok("[a:b:c:d]"), Expression::Group { .. }));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unbalanced_delimiters() {
        assert_parse_fails_with("a [b:c", ErrorCode::E100);
        assert_parse_fails_with("a (b", ErrorCode::E100);
        assert_parse_fails_with("a b)", ErrorCode::E101);
        assert_parse_fails_with("(a]", ErrorCode::E101);
    }

    #[test]
    fn test_error_kinds() {
        let err = parse_source("$missing cat").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedVariable);

        let err = parse_source("[cat").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedExpression);
    }

    #[test]
    fn test_structural_errors_after_resolution() {
        assert_parse_fails_with("$a = cat\n[$a:dog", ErrorCode::E100);
    }
}

#[cfg(test)]
mod variable_pipeline_tests {
    use super::*;

    #[test]
    fn test_variables_resolved_before_structure() {
        assert_eq!(
            parse_ok("$a = a lot of animals\n$b($c) = I love $c\n$b($a)"),
            lit("I love a lot of animals")
        );
    }

    #[test]
    fn test_variable_inside_construct() {
        let source = "$w = 1.5\n($subject = cat\n$subject:$w)";
        let Expression::AttentionStatic { child, weight } = parse_ok(source) else {
            panic!("expected attention");
        };
        assert_eq!(weight, 1.5);
        assert_eq!(*child, lit("cat"));
    }
}
