//! Named blend curves for keyframe interpolation.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error returned when a curve name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown curve `{name}`")]
pub struct ParseCurveError {
    name: String,
}

impl ParseCurveError {
    /// Returns the name that failed to parse.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The curve used to blend between the keyframes of a curve interpolation.
///
/// Curves only describe how the host blends keyframes at render time. They
/// never change which literal prompt texts appear in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Curve {
    /// Straight-line blend. Used when a boundary list names no curve.
    #[default]
    Linear,
    /// Cubic Bezier ease between keyframes.
    Bezier,
    /// Catmull-Rom spline through the keyframes.
    Catmull,
    /// Average of all keyframes.
    Mean,
}

impl Curve {
    /// All curves, in declaration order.
    pub const ALL: [Curve; 4] = [Curve::Linear, Curve::Bezier, Curve::Catmull, Curve::Mean];

    /// Returns the canonical lowercase name of the curve.
    pub fn name(self) -> &'static str {
        match self {
            Curve::Linear => "linear",
            Curve::Bezier => "bezier",
            Curve::Catmull => "catmull",
            Curve::Mean => "mean",
        }
    }
}

impl FromStr for Curve {
    type Err = ParseCurveError;

    /// Parses a curve name, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Curve::ALL
            .into_iter()
            .find(|curve| curve.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseCurveError {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
