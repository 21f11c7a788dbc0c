//! The prompt expression tree.
//!
//! An [`Expression`] is produced by the parser after variable resolution and
//! consumed by the scheduler. Trees are immutable and own their children;
//! every consumer matches the variant set exhaustively.
//!
//! Constructs the scheduler does not interpret (classic host syntax such as
//! `(positive weight)` or `[a|b|c]`) are kept as [`Expression::Group`] so that
//! their text survives byte-for-byte apart from whitespace normalization.

use std::fmt;

use thiserror::Error;

use crate::curve::Curve;

/// Errors raised when constructing an invalid expression node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("alternation requires at least one option")]
    EmptyAlternation,

    #[error("curve interpolation requires at least two keyframes, found {0}")]
    TooFewKeyframes(usize),

    #[error("curve interpolation has {keyframes} keyframes but {positions} positions")]
    PositionCountMismatch { keyframes: usize, positions: usize },
}

/// The delimiter pair of a passthrough group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `( ... )`
    Paren,
    /// `[ ... ]`
    Bracket,
}

impl Delimiter {
    /// Returns the opening character.
    pub fn open(self) -> char {
        match self {
            Delimiter::Paren => '(',
            Delimiter::Bracket => '[',
        }
    }

    /// Returns the closing character.
    pub fn close(self) -> char {
        match self {
            Delimiter::Paren => ')',
            Delimiter::Bracket => ']',
        }
    }
}

/// The step field of a classic step switch, e.g. the `5` in `[a:b:5]`.
///
/// The original text is retained so the switch renders exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct StepBoundary {
    value: f64,
    text: String,
}

impl StepBoundary {
    /// Creates a boundary from its numeric value and source text.
    pub fn new(value: f64, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }

    /// Returns the numeric value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the text as written in the prompt.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A cyclic rotation through options, `[a|b|c:period]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternation {
    options: Vec<Expression>,
    period: f64,
}

impl Alternation {
    /// Creates an alternation.
    ///
    /// Periods below one step are clamped to one step.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::EmptyAlternation`] if `options` is empty.
    pub fn new(options: Vec<Expression>, period: f64) -> Result<Self, ExpressionError> {
        if options.is_empty() {
            return Err(ExpressionError::EmptyAlternation);
        }
        Ok(Self {
            options,
            period: period.max(1.0),
        })
    }

    /// Returns the options in rotation order.
    pub fn options(&self) -> &[Expression] {
        &self.options
    }

    /// Returns the number of steps each option stays active.
    pub fn period(&self) -> f64 {
        self.period
    }
}

/// Keyframes placed at step positions and blended with a [`Curve`].
///
/// There is one position per keyframe. `None` marks an elided position
/// that the scheduler fills in from its pinned neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveInterpolation {
    keyframes: Vec<Expression>,
    positions: Vec<Option<f64>>,
    curve: Curve,
}

impl CurveInterpolation {
    /// Creates a curve interpolation.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two keyframes or if the
    /// number of positions differs from the number of keyframes.
    pub fn new(
        keyframes: Vec<Expression>,
        positions: Vec<Option<f64>>,
        curve: Curve,
    ) -> Result<Self, ExpressionError> {
        if keyframes.len() < 2 {
            return Err(ExpressionError::TooFewKeyframes(keyframes.len()));
        }
        if keyframes.len() != positions.len() {
            return Err(ExpressionError::PositionCountMismatch {
                keyframes: keyframes.len(),
                positions: positions.len(),
            });
        }
        Ok(Self {
            keyframes,
            positions,
            curve,
        })
    }

    /// Creates a curve interpolation whose positions are all elided.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two keyframes.
    pub fn elided(keyframes: Vec<Expression>, curve: Curve) -> Result<Self, ExpressionError> {
        let positions = vec![None; keyframes.len()];
        Self::new(keyframes, positions, curve)
    }

    /// Returns the keyframes in order.
    pub fn keyframes(&self) -> &[Expression] {
        &self.keyframes
    }

    /// Returns the keyframe positions, `None` where elided.
    pub fn positions(&self) -> &[Option<f64>] {
        &self.positions
    }

    /// Returns the blend curve.
    pub fn curve(&self) -> Curve {
        self.curve
    }
}

/// A node of the prompt expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Opaque prompt text.
    Literal(String),

    /// Children rendered in order and joined with single spaces.
    Sequence(Vec<Expression>),

    /// A construct left to the host grammar, rendered as
    /// `open field (separator field)* close`.
    Group {
        delimiter: Delimiter,
        separator: char,
        fields: Vec<Expression>,
    },

    /// `(child:weight)`
    AttentionStatic { child: Box<Expression>, weight: f64 },

    /// `(child:start,end)`, a weight that moves linearly across the active range.
    AttentionInterpolated {
        child: Box<Expression>,
        start: f64,
        end: f64,
    },

    /// The classic host switch `[from:to:step]`, `[to:step]` or `[from::step]`.
    ///
    /// `from` is `None` for the two-field form. `boundary` is `None` when the
    /// step field is empty.
    StepSwitch {
        from: Option<Box<Expression>>,
        to: Box<Expression>,
        boundary: Option<StepBoundary>,
    },

    /// `[a|b|c:period]`
    Alternation(Alternation),

    /// `[a:b:c:p1,p2,p3:curve]`
    CurveInterpolation(CurveInterpolation),
}

impl Expression {
    /// Creates a literal expression.
    pub fn literal(text: impl Into<String>) -> Self {
        Expression::Literal(text.into())
    }

    /// Returns `true` for a literal with no text.
    pub fn is_empty_literal(&self) -> bool {
        matches!(self, Expression::Literal(text) if text.is_empty())
    }

    /// Returns `true` if the subtree contains a construct that varies over steps.
    pub fn is_time_varying(&self) -> bool {
        match self {
            Expression::Literal(_) => false,
            Expression::Sequence(children) => children.iter().any(Expression::is_time_varying),
            Expression::Group { fields, .. } => fields.iter().any(Expression::is_time_varying),
            Expression::AttentionStatic { child, .. } => child.is_time_varying(),
            Expression::AttentionInterpolated { .. }
            | Expression::Alternation(_)
            | Expression::CurveInterpolation(_)
            | Expression::StepSwitch { .. } => true,
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self {
            Expression::Literal(text) => writeln!(f, "{:indent$}Literal {text:?}", ""),
            Expression::Sequence(children) => {
                writeln!(f, "{:indent$}Sequence", "")?;
                children
                    .iter()
                    .try_for_each(|child| child.write_tree(f, depth + 1))
            }
            Expression::Group {
                delimiter,
                separator,
                fields,
            } => {
                writeln!(
                    f,
                    "{:indent$}Group {}{separator}{}",
                    "",
                    delimiter.open(),
                    delimiter.close()
                )?;
                fields
                    .iter()
                    .try_for_each(|field| field.write_tree(f, depth + 1))
            }
            Expression::AttentionStatic { child, weight } => {
                writeln!(f, "{:indent$}Attention {}", "", format_weight(*weight))?;
                child.write_tree(f, depth + 1)
            }
            Expression::AttentionInterpolated { child, start, end } => {
                writeln!(
                    f,
                    "{:indent$}Attention {} -> {}",
                    "",
                    format_weight(*start),
                    format_weight(*end)
                )?;
                child.write_tree(f, depth + 1)
            }
            Expression::StepSwitch { from, to, boundary } => {
                let step = boundary.as_ref().map_or("", StepBoundary::text);
                writeln!(f, "{:indent$}StepSwitch at {step:?}", "")?;
                if let Some(from) = from {
                    from.write_tree(f, depth + 1)?;
                }
                to.write_tree(f, depth + 1)
            }
            Expression::Alternation(alternation) => {
                writeln!(
                    f,
                    "{:indent$}Alternation every {}",
                    "",
                    format_weight(alternation.period())
                )?;
                alternation
                    .options()
                    .iter()
                    .try_for_each(|option| option.write_tree(f, depth + 1))
            }
            Expression::CurveInterpolation(interpolation) => {
                let positions: Vec<String> = interpolation
                    .positions()
                    .iter()
                    .map(|position| position.map_or_else(|| "_".to_string(), format_weight))
                    .collect();
                writeln!(
                    f,
                    "{:indent$}CurveInterpolation {} at [{}]",
                    "",
                    interpolation.curve(),
                    positions.join(", ")
                )?;
                interpolation
                    .keyframes()
                    .iter()
                    .try_for_each(|keyframe| keyframe.write_tree(f, depth + 1))
            }
        }
    }
}

/// Renders the tree, one node per line, children indented.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Formats a weight or step value the way it appears in prompt text.
///
/// Uses the shortest representation that round-trips, always keeping a
/// fractional part: `1.0`, `-2.1`, `0.55`.
pub fn format_weight(value: f64) -> String {
    format!("{value:?}")
}
