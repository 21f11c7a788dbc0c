//! The interpolation tensor: evaluation of an expression over diffusion steps.
//!
//! Evaluation is a structural recursion. Every node is asked to render
//! itself within an *active range* of steps and answers with segments that
//! cover that range. Independent choice points in a sequence or group are
//! combined as a cartesian product; step switches, alternations and curve
//! interpolations hand sequential slices of the range to their children.
//!
//! Two results are derived from the segments:
//!
//! - a [`Schedule`] that assigns exactly one literal prompt to every step, and
//! - a prompt database holding every literal prompt the host must encode,
//!   which also includes the neighbouring keyframes a curve blends with.

mod segment;
mod steps;

use std::ops::Range;

use indexmap::IndexSet;
use log::{debug, trace};

use prompt_fusion_core::{
    expression::{Alternation, CurveInterpolation, Expression, StepBoundary, format_weight},
    schedule::{Schedule, ScheduleEntry},
};

use segment::Segment;

/// Default cap on the number of leaves an interpolated weight expands into.
pub const DEFAULT_MAX_INTERPOLATION_LEAVES: usize = 1000;

/// The step budget and host flags an evaluation runs under.
///
/// The host flags are carried unchanged through every recursive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    total_steps: usize,
    is_hires: bool,
    use_old_scheduling: bool,
    max_interpolation_leaves: usize,
}

impl StepContext {
    /// Creates a context for `total_steps` steps with both host flags off.
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            is_hires: false,
            use_old_scheduling: false,
            max_interpolation_leaves: DEFAULT_MAX_INTERPOLATION_LEAVES,
        }
    }

    /// Sets whether this is the hires pass.
    pub fn with_hires(mut self, is_hires: bool) -> Self {
        self.is_hires = is_hires;
        self
    }

    /// Sets whether the host uses its old step semantics.
    pub fn with_old_scheduling(mut self, use_old_scheduling: bool) -> Self {
        self.use_old_scheduling = use_old_scheduling;
        self
    }

    /// Caps the number of leaves of an interpolated weight. Zero is read as one.
    pub fn with_max_interpolation_leaves(mut self, max_interpolation_leaves: usize) -> Self {
        self.max_interpolation_leaves = max_interpolation_leaves.max(1);
        self
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn is_hires(&self) -> bool {
        self.is_hires
    }

    pub fn use_old_scheduling(&self) -> bool {
        self.use_old_scheduling
    }

    pub fn max_interpolation_leaves(&self) -> usize {
        self.max_interpolation_leaves
    }

    /// The full window `[0, total_steps)`.
    pub fn window(&self) -> Range<usize> {
        0..self.total_steps
    }
}

/// Evaluates expressions against a [`StepContext`].
///
/// # Examples
///
/// ```
/// use prompt_fusion::tensor::{InterpolationTensor, StepContext};
///
/// let expression = prompt_fusion_parser::parse("a [cat|dog:1]").unwrap();
/// let tensor = InterpolationTensor::new(StepContext::new(4));
///
/// let schedule = tensor.evaluate(&expression);
/// assert_eq!(schedule.len(), 4);
/// assert_eq!(schedule.text_at(1), Some("a dog"));
/// ```
#[derive(Debug, Clone)]
pub struct InterpolationTensor {
    context: StepContext,
}

impl InterpolationTensor {
    pub fn new(context: StepContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &StepContext {
        &self.context
    }

    /// Schedule `expression` over the full window.
    pub fn evaluate(&self, expression: &Expression) -> Schedule {
        self.extend(expression, self.context.window())
    }

    /// Schedule `expression` over `range`.
    ///
    /// The schedule covers `range` exactly, one entry per run of steps that
    /// share a prompt.
    pub fn extend(&self, expression: &Expression, range: Range<usize>) -> Schedule {
        debug!(
            start = range.start,
            end = range.end,
            hires = self.context.is_hires,
            old_scheduling = self.context.use_old_scheduling;
            "Evaluating expression",
        );
        let mut segments = self.segments(expression, &range);
        segments.retain(|segment| !segment.span.is_empty());
        segments.sort_by_key(|segment| segment.span.start);

        let schedule = Schedule::from_entries(
            segments
                .into_iter()
                .map(|segment| ScheduleEntry::new(segment.span.start, segment.span.end, segment.text)),
        );
        debug!(entries = schedule.len(); "Schedule built");
        schedule
    }

    /// Every distinct prompt the host must encode for `expression`.
    ///
    /// Prompts appear in schedule order first, followed by prompts that are
    /// only reached as blend partners of a curve keyframe. Keyframes that
    /// never contribute to a step are left out.
    pub fn prompt_database(&self, expression: &Expression) -> IndexSet<String> {
        let range = self.context.window();
        let segments = self.segments(expression, &range);

        let mut database = self.extend(expression, range.clone()).prompt_database();
        database.extend(
            segments
                .into_iter()
                .filter(|segment| !segment.support.is_empty() || range.is_empty())
                .map(|segment| segment.text),
        );
        trace!(prompts = database.len(); "Prompt database built");
        database
    }

    // ============================================================================
    // Recursive evaluation
    // ============================================================================

    fn segments(&self, expression: &Expression, range: &Range<usize>) -> Vec<Segment> {
        match expression {
            Expression::Literal(text) => vec![Segment::new(text.as_str(), range.clone())],
            Expression::Sequence(children) => {
                let axes = self.axes(children, range);
                segment::product(&axes, range, join_nonempty)
            }
            Expression::Group {
                delimiter,
                separator,
                fields,
            } => {
                let axes = self.axes(fields, range);
                let separator = separator.to_string();
                segment::product(&axes, range, |texts| {
                    format!(
                        "{}{}{}",
                        delimiter.open(),
                        texts.join(&separator),
                        delimiter.close()
                    )
                })
            }
            Expression::AttentionStatic { child, weight } => self
                .segments(child, range)
                .iter()
                .map(|segment| {
                    segment.with_text(format!("({}:{})", segment.text, format_weight(*weight)))
                })
                .collect(),
            Expression::AttentionInterpolated { child, start, end } => self
                .segments(child, range)
                .iter()
                .map(|segment| segment.with_text(self.discretize(&segment.text, *start, *end, range)))
                .collect(),
            Expression::StepSwitch { from, to, boundary } => {
                self.step_switch(from.as_deref(), to, boundary.as_ref(), range)
            }
            Expression::Alternation(alternation) => self.alternation(alternation, range),
            Expression::CurveInterpolation(interpolation) => {
                self.curve_interpolation(interpolation, range)
            }
        }
    }

    fn axes(&self, children: &[Expression], range: &Range<usize>) -> Vec<Vec<Segment>> {
        children
            .iter()
            .map(|child| self.segments(child, range))
            .collect()
    }

    /// Expand an interpolated weight into nested host step switches.
    ///
    /// The range is cut into up to `max_interpolation_leaves` leaves, each
    /// holding the weight sampled at its position.
    fn discretize(&self, text: &str, start: f64, end: f64, range: &Range<usize>) -> String {
        let leaves = range.len().min(self.context.max_interpolation_leaves);
        if leaves <= 1 {
            return format!("({text}:{})", format_weight(start));
        }

        let bounds = steps::leaf_bounds(range, leaves);
        trace!(leaves; "Discretizing interpolated attention");

        let mut out = String::new();
        for leaf in 0..leaves {
            let weighted = format!(
                "({text}:{})",
                format_weight(steps::leaf_weight(start, end, leaf, leaves))
            );
            let (begin, until) = (bounds[leaf], bounds[leaf + 1]);
            if leaf == 0 {
                out.push_str(&format!("[{weighted}::{until}]"));
            } else if leaf + 1 == leaves {
                out.push_str(&format!("[{weighted}:{begin}]"));
            } else {
                out.push_str(&format!("[[{weighted}:{begin}]::{until}]"));
            }
        }
        out
    }

    fn step_switch(
        &self,
        from: Option<&Expression>,
        to: &Expression,
        boundary: Option<&StepBoundary>,
        range: &Range<usize>,
    ) -> Vec<Segment> {
        let (from_range, to_range) = match boundary {
            Some(boundary) => {
                let step = steps::resolve_step(boundary.value(), range);
                (range.start..step, step..range.end)
            }
            None => (range.clone(), range.clone()),
        };
        let step_text = boundary.map_or("", StepBoundary::text);

        let to_segments = segment::stretch(self.segments(to, &to_range), range);
        match from {
            Some(from) => {
                let from_segments = segment::stretch(self.segments(from, &from_range), range);
                segment::product(&[from_segments, to_segments], range, |texts| {
                    format!("[{}:{}:{step_text}]", texts[0], texts[1])
                })
            }
            None => to_segments
                .iter()
                .map(|segment| segment.with_text(format!("[{}:{step_text}]", segment.text)))
                .collect(),
        }
    }

    fn alternation(&self, alternation: &Alternation, range: &Range<usize>) -> Vec<Segment> {
        let options = alternation.options();
        steps::alternation_runs(range, alternation.period(), options.len())
            .into_iter()
            .flat_map(|(option, run)| self.segments(&options[option], &run))
            .collect()
    }

    fn curve_interpolation(
        &self,
        interpolation: &CurveInterpolation,
        range: &Range<usize>,
    ) -> Vec<Segment> {
        let positions = steps::resolve_positions(interpolation.positions(), range);
        let points = steps::switch_points(&positions, range);
        trace!(
            curve:% = interpolation.curve(),
            positions:?,
            points:?;
            "Resolved keyframe positions",
        );

        interpolation
            .keyframes()
            .iter()
            .enumerate()
            .flat_map(|(index, keyframe)| {
                let slice = points[index]..points[index + 1];
                let window = steps::blend_window(&positions, index, range);
                segment::widen_support(self.segments(keyframe, &slice), &window)
            })
            .collect()
    }
}

fn join_nonempty(texts: &[&str]) -> String {
    texts
        .iter()
        .filter(|text| !text.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
