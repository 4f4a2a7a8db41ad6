//! Bounded-memory distribution of point arrays to the parts that need them.
//!
//! A point array is as long as the global node array, but a request usually
//! concerns a handful of parts whose points occupy sparse, non-contiguous
//! id ranges. The windower
//! 1. sorts the interested parts by `(min, max, slot)`,
//! 2. reads only the window `[lowest min, highest max)`,
//! 3. streams that window in fixed-size chunks, and
//! 4. for every chunk, retires parts whose range ended before it and hands
//!    the chunk to the parts whose range starts before its end.
//!
//! The working set is a sorted vector with a moving front index; nothing is
//! physically removed.

use std::ops::Range;

use log::warn;

use crate::topology::slot::PartSlot;

/// Global point range `[min, max)` of one part.
///
/// The derived ordering is lexicographic over `(min, max, slot)`, a strict
/// total order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartRange {
    pub min: u64,
    pub max: u64,
    pub slot: PartSlot,
}

impl PartRange {
    pub fn new(slot: PartSlot, range: Range<u64>) -> Self {
        Self {
            min: range.start,
            max: range.end,
            slot,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max <= self.min
    }
}

/// The contiguous point window read for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointWindow {
    /// First global point id read.
    pub low: u64,
    /// One past the last global point id read.
    pub high: u64,
    /// Tuples skipped before the window.
    pub skip_start: u64,
    /// Tuples skipped after the window.
    pub skip_end: u64,
}

impl PointWindow {
    /// Tuples inside the window.
    #[inline]
    pub fn len(&self) -> u64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.high <= self.low
    }

    /// Absolute chunk ranges of at most `chunk_len` tuples covering the window;
    /// the last one holds the remainder.
    pub fn chunks(&self, chunk_len: u64) -> impl Iterator<Item = Range<u64>> + use<> {
        let chunk_len = chunk_len.max(1);
        let high = self.high;
        (self.low..high)
            .step_by(chunk_len as usize)
            .map(move |start| start..(start + chunk_len).min(high))
    }
}

/// Interested parts sorted by range, with a front index of the first part not
/// yet fully served.
#[derive(Clone, Debug, Default)]
pub struct SortedParts {
    ranges: Vec<PartRange>,
    first: usize,
}

impl SortedParts {
    /// Sorts `ranges`, discarding empty ones.
    pub fn new(mut ranges: Vec<PartRange>) -> Self {
        ranges.retain(|r| !r.is_empty());
        ranges.sort_unstable();
        Self { ranges, first: 0 }
    }

    /// Number of parts still in the working set.
    pub fn len(&self) -> usize {
        self.ranges.len() - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Working set in sorted order.
    pub fn active(&self) -> &[PartRange] {
        &self.ranges[self.first..]
    }

    /// The window covering every part, for an array of `total` tuples.
    ///
    /// `None` when no part has points. A window reaching past `total` is
    /// clamped to it.
    pub fn window(&self, total: u64) -> Option<PointWindow> {
        let low = self.ranges.first()?.min;
        let mut high = self.ranges.iter().map(|r| r.max).max()?;
        if high > total {
            warn!("point window ends at {high} but the array holds {total} tuples; clamping");
            high = total;
        }
        let low = low.min(high);
        Some(PointWindow {
            low,
            high,
            skip_start: low,
            skip_end: total - high,
        })
    }

    /// Advances the front past parts whose range ends at or before `offset`.
    pub fn retire_before(&mut self, offset: u64) {
        while self
            .ranges
            .get(self.first)
            .is_some_and(|r| r.max <= offset)
        {
            self.first += 1;
        }
    }

    /// Slots, from the front, of the parts starting before `chunk.end`.
    ///
    /// The walk stops at the first part starting at or after the chunk end.
    pub fn overlapping(&self, chunk: Range<u64>) -> impl Iterator<Item = PartSlot> + '_ {
        self.active()
            .iter()
            .take_while(move |r| r.min < chunk.end)
            .map(|r| r.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(slot: u32, range: Range<u64>) -> PartRange {
        PartRange::new(PartSlot::new(slot), range)
    }

    #[test]
    fn window_over_sparse_ranges() {
        let parts = SortedParts::new(vec![pr(1, 20..30), pr(0, 0..10)]);
        assert_eq!(
            parts.window(40),
            Some(PointWindow {
                low: 0,
                high: 30,
                skip_start: 0,
                skip_end: 10
            })
        );
    }

    #[test]
    fn high_is_the_largest_max_not_the_last_one() {
        let parts = SortedParts::new(vec![pr(0, 5..50), pr(1, 10..20)]);
        let w = parts.window(100).unwrap();
        assert_eq!((w.low, w.high), (5, 50));
        assert_eq!(w.skip_end, 50);
    }

    #[test]
    fn ordering_breaks_ties_on_max_then_slot() {
        let parts = SortedParts::new(vec![pr(2, 0..9), pr(1, 0..5), pr(0, 0..9)]);
        let order: Vec<_> = parts.active().iter().map(|r| r.slot.get()).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn empty_ranges_are_discarded() {
        let parts = SortedParts::new(vec![pr(0, 4..4)]);
        assert!(parts.is_empty());
        assert_eq!(parts.window(10), None);
    }

    #[test]
    fn chunks_cover_window_with_remainder() {
        let w = PointWindow {
            low: 3,
            high: 13,
            skip_start: 3,
            skip_end: 0,
        };
        let chunks: Vec<_> = w.chunks(4).collect();
        assert_eq!(chunks, vec![3..7, 7..11, 11..13]);
    }

    #[test]
    fn retirement_and_overlap_walk() {
        let mut parts = SortedParts::new(vec![pr(0, 0..10), pr(1, 8..12), pr(2, 20..30)]);
        let hit: Vec<_> = parts.overlapping(0..5).map(|s| s.get()).collect();
        assert_eq!(hit, vec![0]);
        parts.retire_before(10);
        let hit: Vec<_> = parts.overlapping(10..15).map(|s| s.get()).collect();
        assert_eq!(hit, vec![1]);
        parts.retire_before(25);
        assert_eq!(parts.len(), 1);
        let hit: Vec<_> = parts.overlapping(25..30).map(|s| s.get()).collect();
        assert_eq!(hit, vec![2]);
    }

    #[test]
    fn window_clamps_to_array() {
        let parts = SortedParts::new(vec![pr(0, 2..12)]);
        let w = parts.window(10).unwrap();
        assert_eq!((w.high, w.skip_end), (10, 0));
    }
}
