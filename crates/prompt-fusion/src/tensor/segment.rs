//! Step segments and the operations that combine them.

use std::ops::Range;

/// One literal variant of an expression over part of the active range.
///
/// `span` is the part of the range where this variant is the one scheduled.
/// `support` is the part where the host may still need it, which is wider
/// than `span` for curve keyframes that are blended with their neighbours.
/// `span` always lies within `support`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub text: String,
    pub span: Range<usize>,
    pub support: Range<usize>,
}

impl Segment {
    pub fn new(text: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            text: text.into(),
            support: range.clone(),
            span: range,
        }
    }

    pub fn with_text(&self, text: String) -> Self {
        Self {
            text,
            span: self.span.clone(),
            support: self.support.clone(),
        }
    }
}

fn intersect(a: &Range<usize>, b: &Range<usize>) -> Range<usize> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    start..end.max(start)
}

fn hull(a: &Range<usize>, b: &Range<usize>) -> Range<usize> {
    a.start.min(b.start)..a.end.max(b.end)
}

/// Combine independent axes.
///
/// Every combination of one segment per axis is rendered by `render` over
/// the intersection of the combination's ranges. Combinations whose supports
/// do not meet are dropped. Inside an empty active range every segment is a
/// point, so every combination is kept.
pub(crate) fn product<F>(axes: &[Vec<Segment>], active: &Range<usize>, render: F) -> Vec<Segment>
where
    F: Fn(&[&str]) -> String,
{
    let mut combinations: Vec<(Vec<&str>, Range<usize>, Range<usize>)> =
        vec![(Vec::new(), active.clone(), active.clone())];

    for axis in axes {
        let mut next = Vec::with_capacity(combinations.len() * axis.len());
        for (texts, span, support) in &combinations {
            for segment in axis {
                let support = intersect(support, &segment.support);
                if support.is_empty() && !active.is_empty() {
                    continue;
                }
                let mut texts = texts.clone();
                texts.push(segment.text.as_str());
                next.push((texts, intersect(span, &segment.span), support));
            }
        }
        combinations = next;
    }

    combinations
        .into_iter()
        .map(|(texts, span, support)| Segment {
            text: render(&texts),
            span,
            support,
        })
        .collect()
}

/// Indices of the first and last scheduled segments of a position-sorted list.
///
/// When nothing is scheduled (the list only holds points) the last segment
/// stands for both ends.
fn ends(segments: &[Segment]) -> Option<(usize, usize)> {
    let mut scheduled = segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| !segment.span.is_empty())
        .map(|(index, _)| index);
    match scheduled.next() {
        Some(first) => Some((first, scheduled.last().unwrap_or(first))),
        None => segments.len().checked_sub(1).map(|last| (last, last)),
    }
}

/// Widen a branch so it covers `range` from its first to its last segment.
///
/// The earliest scheduled segment is pulled back to the start of `range`
/// and the latest pushed out to its end. Points left unreachable are dropped.
pub(crate) fn stretch(mut segments: Vec<Segment>, range: &Range<usize>) -> Vec<Segment> {
    segments.sort_by_key(|segment| segment.span.start);
    if let Some((first, last)) = ends(&segments) {
        let first = &mut segments[first];
        first.span.start = range.start;
        first.support.start = first.support.start.min(range.start);

        let last = &mut segments[last];
        last.span.end = range.end;
        last.support.end = last.support.end.max(range.end);
    }
    segments.retain(|segment| !segment.support.is_empty() || range.is_empty());
    segments
}

/// Widen the supports of a keyframe's segments to its blend window.
pub(crate) fn widen_support(mut segments: Vec<Segment>, window: &Range<usize>) -> Vec<Segment> {
    segments.sort_by_key(|segment| segment.span.start);
    if let Some((first, last)) = ends(&segments) {
        let first = &mut segments[first];
        first.support = hull(&first.support, &(window.start..first.support.end));

        let last = &mut segments[last];
        last.support = hull(&last.support, &(last.support.start..window.end));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(texts: &[&str]) -> String {
        texts.join(" ")
    }

    #[test]
    fn test_product_intersects_spans() {
        let axes = vec![
            vec![Segment::new("a", 0..5), Segment::new("b", 5..10)],
            vec![Segment::new("x", 0..3), Segment::new("y", 3..10)],
        ];

        let segments = product(&axes, &(0..10), join);
        let scheduled: Vec<(&str, Range<usize>)> = segments
            .iter()
            .filter(|s| !s.span.is_empty())
            .map(|s| (s.text.as_str(), s.span.clone()))
            .collect();

        assert_eq!(
            scheduled,
            vec![("a x", 0..3), ("a y", 3..5), ("b y", 5..10)]
        );
    }

    #[test]
    fn test_product_keeps_overlapping_supports() {
        let mut a = Segment::new("a", 0..5);
        a.support = 0..10;
        let axes = vec![
            vec![a, Segment::new("b", 5..10)],
            vec![Segment::new("x", 5..10)],
        ];

        let texts: Vec<String> = product(&axes, &(0..10), join)
            .into_iter()
            .map(|s| s.text)
            .collect();

        assert_eq!(texts, vec!["a x", "b x"]);
    }

    #[test]
    fn test_product_in_empty_range() {
        let axes = vec![
            vec![Segment::new("a", 3..3), Segment::new("b", 3..3)],
            vec![Segment::new("x", 3..3)],
        ];

        assert_eq!(product(&axes, &(3..3), join).len(), 2);
    }

    #[test]
    fn test_stretch() {
        let segments = vec![Segment::new("a", 4..6), Segment::new("b", 6..8)];

        let stretched = stretch(segments, &(0..10));

        assert_eq!(stretched[0].span, 0..6);
        assert_eq!(stretched[1].span, 6..10);
        assert_eq!(stretched[1].support, 6..10);
    }

    #[test]
    fn test_stretch_sorts_by_position() {
        let mut blend = Segment::new("blend", 0..0);
        blend.support = 0..8;
        let segments = vec![Segment::new("b", 6..8), blend, Segment::new("a", 4..6)];

        let stretched = stretch(segments, &(0..10));
        let spans: Vec<(&str, Range<usize>)> = stretched
            .iter()
            .map(|s| (s.text.as_str(), s.span.clone()))
            .collect();

        assert_eq!(spans, vec![("blend", 0..0), ("a", 0..6), ("b", 6..10)]);
    }

    #[test]
    fn test_stretch_point_branch() {
        let segments = vec![Segment::new("a", 0..0), Segment::new("b", 0..0)];

        let stretched = stretch(segments, &(0..10));

        assert_eq!(stretched, vec![Segment::new("b", 0..10)]);
    }

    #[test]
    fn test_widen_support() {
        let segments = vec![Segment::new("a", 4..6)];

        let widened = widen_support(segments, &(2..9));

        assert_eq!(widened[0].span, 4..6);
        assert_eq!(widened[0].support, 2..9);
    }
}
