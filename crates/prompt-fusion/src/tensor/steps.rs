//! Step arithmetic: boundary resolution, keyframe positions and leaf splits.

use std::ops::Range;

/// Resolve a written step value against the active range.
///
/// Values below one are fractions of the range; larger values are absolute
/// step indices. The result is clamped into `[range.start, range.end]`.
pub(crate) fn resolve_step(value: f64, range: &Range<usize>) -> usize {
    let (start, end) = (range.start as f64, range.end as f64);
    let step = if value < 1.0 {
        start + (value * (end - start)).floor()
    } else {
        value.floor()
    };
    step.clamp(start, end) as usize
}

/// Resolve keyframe positions, filling in elided ones.
///
/// An elided first position is the start of the range and an elided last
/// position its end. Elided positions in between are spread evenly between
/// their nearest resolved neighbours. The result never decreases.
pub(crate) fn resolve_positions(positions: &[Option<f64>], range: &Range<usize>) -> Vec<usize> {
    let count = positions.len();
    let mut resolved: Vec<Option<usize>> = positions
        .iter()
        .map(|position| position.map(|value| resolve_step(value, range)))
        .collect();

    if let Some(first) = resolved.first_mut() {
        first.get_or_insert(range.start);
    }
    if let Some(last) = resolved.last_mut() {
        last.get_or_insert(range.end);
    }

    let mut left = 0;
    while left + 1 < count {
        let right = (left + 1..count)
            .find(|&index| resolved[index].is_some())
            .unwrap_or(count - 1);
        let from = resolved[left].unwrap_or(range.start) as i128;
        let to = resolved[right].unwrap_or(range.end) as i128;
        let gap = (right - left) as i128;
        for index in left + 1..right {
            let offset = (to - from) * (index - left) as i128 / gap;
            resolved[index] = Some((from + offset).max(0) as usize);
        }
        left = right;
    }

    let mut floor = range.start;
    resolved
        .into_iter()
        .map(|position| {
            floor = floor.max(position.unwrap_or(floor));
            floor
        })
        .collect()
}

/// Switch points of resolved positions, including both range ends.
///
/// Keyframe `i` is scheduled over `[q[i], q[i + 1])`, where each inner
/// switch point is the midpoint of two neighbouring positions.
pub(crate) fn switch_points(positions: &[usize], range: &Range<usize>) -> Vec<usize> {
    let mut points = Vec::with_capacity(positions.len() + 1);
    points.push(range.start);
    points.extend(positions.windows(2).map(|pair| (pair[0] + pair[1]) / 2));
    points.push(range.end);
    points
}

/// Steps over which keyframe `index` contributes to the blend.
///
/// A keyframe fades in from its previous neighbour's position and out at
/// its next neighbour's position.
pub(crate) fn blend_window(positions: &[usize], index: usize, range: &Range<usize>) -> Range<usize> {
    let start = match index {
        0 => range.start,
        _ => positions[index - 1],
    };
    let end = positions.get(index + 1).copied().unwrap_or(range.end);
    start..end.max(start)
}

/// Consecutive steps of `range` that select the same alternation option.
///
/// Step `s` selects option `floor((s - start) / period) % options`, so run
/// `j` starts at the first offset whose quotient reaches `j`. `period` is at
/// least one, which keeps every run non-empty.
pub(crate) fn alternation_runs(
    range: &Range<usize>,
    period: f64,
    options: usize,
) -> Vec<(usize, Range<usize>)> {
    let length = range.end - range.start;
    if length == 0 || options <= 1 || !period.is_finite() || period as u128 >= length as u128 {
        return vec![(0, range.clone())];
    }

    let quotient = |offset: usize| (offset as f64 / period).floor() as usize;
    let run_start = |run: usize| {
        let mut offset = ((run as f64) * period).ceil().min(length as f64) as usize;
        while offset > 0 && quotient(offset - 1) >= run {
            offset -= 1;
        }
        while offset < length && quotient(offset) < run {
            offset += 1;
        }
        offset
    };

    let mut runs = Vec::with_capacity((length as f64 / period).ceil() as usize);
    let mut start = 0;
    let mut run = 0;
    while start < length {
        let end = run_start(run + 1).max(start + 1);
        runs.push((run % options, range.start + start..range.start + end));
        start = end;
        run += 1;
    }
    runs
}

/// Start steps of `leaves` equal leaves over `range`, followed by its end.
pub(crate) fn leaf_bounds(range: &Range<usize>, leaves: usize) -> Vec<usize> {
    let length = (range.end - range.start) as u128;
    let leaves_wide = leaves.max(1) as u128;
    (0..=leaves)
        .map(|leaf| range.start + (leaf as u128 * length / leaves_wide) as usize)
        .collect()
}

/// Weight of leaf `leaf` of `leaves`, moving linearly from `start` to `end`.
pub(crate) fn leaf_weight(start: f64, end: f64, leaf: usize, leaves: usize) -> f64 {
    if leaves <= 1 {
        return start;
    }
    start + (end - start) * leaf as f64 / (leaves - 1) as f64
}
