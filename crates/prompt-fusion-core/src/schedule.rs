//! Step schedules: which literal prompt is active at which diffusion step.

use std::ops::Range;

use indexmap::IndexSet;
use serde::Serialize;

/// One contiguous step range `[start, end)` with a constant prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    start: usize,
    end: usize,
    text: String,
}

impl ScheduleEntry {
    /// Creates an entry covering `[start, end)`.
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Returns the first step of the entry.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the step one past the last step of the entry.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the step range of the entry.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the literal prompt text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the entry covers no step.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// An ordered, gap-free and non-overlapping list of [`ScheduleEntry`].
///
/// Adjacent entries never share the same text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Builds a schedule from entries ordered by start step.
    ///
    /// Empty ranges are dropped and adjacent entries with equal text are
    /// merged into one.
    pub fn from_entries(entries: impl IntoIterator<Item = ScheduleEntry>) -> Self {
        let mut merged: Vec<ScheduleEntry> = Vec::new();
        for entry in entries.into_iter().filter(|entry| !entry.is_empty()) {
            match merged.last_mut() {
                Some(last) if last.end == entry.start && last.text == entry.text => {
                    last.end = entry.end;
                }
                _ => merged.push(entry),
            }
        }
        Self { entries: merged }
    }

    /// Returns the entries in step order.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the text active at `step`, if any entry covers it.
    pub fn text_at(&self, step: usize) -> Option<&str> {
        let index = self.entries.partition_point(|entry| entry.end <= step);
        self.entries
            .get(index)
            .filter(|entry| entry.start <= step)
            .map(ScheduleEntry::text)
    }

    /// Returns `true` if the entries exactly tile `range`.
    pub fn covers(&self, range: Range<usize>) -> bool {
        if range.is_empty() {
            return self.entries.is_empty();
        }
        let mut cursor = range.start;
        for entry in &self.entries {
            if entry.start != cursor || entry.is_empty() {
                return false;
            }
            cursor = entry.end;
        }
        cursor == range.end
    }

    /// Returns the distinct texts in order of first appearance.
    pub fn prompt_database(&self) -> IndexSet<String> {
        self.entries
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }

    /// Returns `(end_at_step, text)` pairs, the shape host encoders consume.
    pub fn host_pairs(&self) -> Vec<(usize, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.end, entry.text.clone()))
            .collect()
    }
}

impl IntoIterator for Schedule {
    type Item = ScheduleEntry;
    type IntoIter = std::vec::IntoIter<ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleEntry;
    type IntoIter = std::slice::Iter<'a, ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
