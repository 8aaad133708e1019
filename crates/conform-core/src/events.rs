//! Sample-accurate control values and timeline merging.
//!
//! A [`SampleAccurate`] control carries the value in effect at tick start
//! plus every change during the tick, keyed by frame offset. Components that
//! read several such controls together use [`merge`] to walk one combined
//! timeline: at each timestamp where any control changes, every control
//! reports its value at that point (carried forward, never interpolated).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A value at a frame offset within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent<T> {
    pub offset: usize,
    pub value: T,
}

impl<T> TimedEvent<T> {
    pub const fn new(offset: usize, value: T) -> Self {
        Self { offset, value }
    }
}

/// What to do with merged rows before every control has a known value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Drop rows until every control has a value.
    #[default]
    SkipUntilKnown,
    /// Use the control's declared initial value for missing entries.
    FillInitial,
}

/// A control with per-frame changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleAccurate<T> {
    /// Value in effect at tick start. `None` until the first value is known.
    pub value: Option<T>,
    /// Changes during the tick, keyed by frame offset.
    pub values: BTreeMap<usize, T>,
}

impl<T: Copy> SampleAccurate<T> {
    pub fn new(value: Option<T>) -> Self {
        Self {
            value,
            values: BTreeMap::new(),
        }
    }

    /// Record a change. A later change at the same offset replaces the
    /// earlier one.
    #[inline]
    pub fn insert(&mut self, offset: usize, value: T) {
        self.values.insert(offset, value);
    }

    /// Value in effect at `offset`: the last change at or before it, else
    /// the running value.
    pub fn value_at(&self, offset: usize) -> Option<T> {
        self.values
            .range(..=offset)
            .next_back()
            .map(|(_, v)| *v)
            .or(self.value)
    }

    /// Last change of the tick, if any.
    pub fn last(&self) -> Option<T> {
        self.values.values().next_back().copied()
    }

    /// Fold this tick's changes into the running value and clear them.
    pub fn commit(&mut self) {
        if let Some(last) = self.last() {
            self.value = Some(last);
        }
        self.values.clear();
    }

    /// Changes in offset order.
    pub fn events(&self) -> impl Iterator<Item = TimedEvent<T>> + '_ {
        self.values.iter().map(|(&offset, &value)| TimedEvent { offset, value })
    }

    pub fn has_changes(&self) -> bool {
        !self.values.is_empty()
    }
}

/// One timestamp of a merged timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow<T> {
    pub offset: usize,
    /// One value per merged control, in the order they were passed.
    pub values: Vec<T>,
}

/// The result of [`merge`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedTimeline<T> {
    rows: Vec<MergedRow<T>>,
}

impl<T> MergedTimeline<T> {
    pub fn rows(&self) -> &[MergedRow<T>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedRow<T>> + '_ {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|r| r.offset)
    }

    pub fn row_at(&self, offset: usize) -> Option<&MergedRow<T>> {
        self.rows
            .binary_search_by_key(&offset, |r| r.offset)
            .ok()
            .map(|i| &self.rows[i])
    }
}

impl<T> IntoIterator for MergedTimeline<T> {
    type Item = MergedRow<T>;
    type IntoIter = std::vec::IntoIter<MergedRow<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

fn merge_from<T: Copy>(timelines: &[&SampleAccurate<T>], mut last: Vec<Option<T>>) -> MergedTimeline<T> {
    let offsets: BTreeSet<usize> = timelines
        .iter()
        .flat_map(|t| t.values.keys().copied())
        .collect();

    let mut rows = Vec::with_capacity(offsets.len());
    for offset in offsets {
        for (slot, timeline) in last.iter_mut().zip(timelines) {
            if let Some(v) = timeline.values.get(&offset) {
                *slot = Some(*v);
            }
        }
        if let Some(values) = last.iter().copied().collect::<Option<Vec<T>>>() {
            rows.push(MergedRow { offset, values });
        }
    }
    MergedTimeline { rows }
}

/// Merge timelines by timestamp, skipping rows until every control has a
/// known value.
pub fn merge<T: Copy>(timelines: &[&SampleAccurate<T>]) -> MergedTimeline<T> {
    merge_from(timelines, timelines.iter().map(|t| t.value).collect())
}

/// Merge timelines by timestamp, using `initial[i]` for control `i` until it
/// has a known value.
pub fn merge_filled<T: Copy>(timelines: &[&SampleAccurate<T>], initial: &[T]) -> MergedTimeline<T> {
    let last = timelines
        .iter()
        .enumerate()
        .map(|(i, t)| t.value.or_else(|| initial.get(i).copied()))
        .collect();
    merge_from(timelines, last)
}
