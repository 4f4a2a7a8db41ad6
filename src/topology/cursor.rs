//! Cursors over a [`RunIndex`](crate::topology::run_index::RunIndex).
//!
//! Two flavours exist:
//! - [`InsertionCursor`] replays the index one cell at a time while the
//!   connectivity block is read a second time. It is a plain value owned by
//!   the caller; `begin`, `advance` and `is_at_end` are the whole protocol.
//! - [`RunCursor`] walks whole runs from an arbitrary global position, and
//!   [`ClippedRuns`] intersects them with a requested window so auxiliary
//!   arrays (ids, dead flags, properties) that arrive in chunks can be split
//!   between parts without ever aligning the chunks to run boundaries.

use crate::topology::run_index::Run;
use crate::topology::slot::PartSlot;

/// Replay position inside one category's runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertionCursor {
    run: usize,
    consumed: u64,
    conn_consumed: u64,
}

/// A run whose last cell was just replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedRun {
    /// Index of the run inside its category.
    pub run: usize,
    /// Connectivity entries actually replayed for the run.
    pub connectivity_len: u64,
}

impl InsertionCursor {
    /// Cursor on the first cell of the first run.
    #[inline]
    pub fn begin() -> Self {
        Self::default()
    }

    /// The run owning the next cell, or `None` once every run was replayed.
    #[inline]
    pub fn current<'a>(&self, runs: &'a [Run]) -> Option<&'a Run> {
        runs.get(self.run)
    }

    /// Whether every registered cell has been replayed.
    #[inline]
    pub fn is_at_end(&self, runs: &[Run]) -> bool {
        self.run >= runs.len()
    }

    /// Global position of the next cell.
    pub fn position(&self, runs: &[Run]) -> u64 {
        runs.get(self.run)
            .map_or_else(|| runs.last().map_or(0, Run::end), |r| r.start + self.consumed)
    }

    /// Steps past one cell carrying `conn_len` connectivity entries.
    ///
    /// Returns the completed run when this cell was the run's last one. At the
    /// end of the index this is a no-op returning `None`.
    pub fn advance(&mut self, runs: &[Run], conn_len: u64) -> Option<CompletedRun> {
        let run = runs.get(self.run)?;
        self.consumed += 1;
        self.conn_consumed += conn_len;
        if self.consumed < run.count {
            return None;
        }
        let done = CompletedRun {
            run: self.run,
            connectivity_len: self.conn_consumed,
        };
        self.run += 1;
        self.consumed = 0;
        self.conn_consumed = 0;
        Some(done)
    }
}

/// Read-only walk over whole runs, starting at the run containing a position.
#[derive(Clone, Debug)]
pub struct RunCursor<'a> {
    runs: &'a [Run],
    next: usize,
}

impl<'a> RunCursor<'a> {
    /// Positions the cursor on the run containing global position `pos`.
    ///
    /// A position past the last run yields an exhausted cursor.
    ///
    /// # Complexity
    /// **O(log runs)**.
    pub fn starting_at(runs: &'a [Run], pos: u64) -> Self {
        let next = runs.partition_point(|r| r.end() <= pos);
        Self { runs, next }
    }

    /// Whether no run is left.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.next >= self.runs.len()
    }

    /// Intersects the remaining runs with `[start, start + count)`.
    pub fn clipped(self, start: u64, count: u64) -> ClippedRuns<'a> {
        ClippedRuns {
            cursor: self,
            start,
            end: start + count,
        }
    }
}

impl Iterator for RunCursor<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let run = self.runs.get(self.next).copied()?;
        self.next += 1;
        Some(run)
    }
}

/// The part of one run that overlaps a requested window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClippedRun {
    /// Receiving part; `None` means consume without delivering.
    pub owner: Option<PartSlot>,
    /// First global position of the overlap.
    pub start: u64,
    /// Offset of `start` from the window start, i.e. into the caller's buffer.
    pub offset: u64,
    /// Number of positions in the overlap, always `> 0`.
    pub len: u64,
}

/// Iterator of [`ClippedRun`]s; ends at the first run past the window.
#[derive(Clone, Debug)]
pub struct ClippedRuns<'a> {
    cursor: RunCursor<'a>,
    start: u64,
    end: u64,
}

impl Iterator for ClippedRuns<'_> {
    type Item = ClippedRun;

    fn next(&mut self) -> Option<ClippedRun> {
        let run = self.cursor.next()?;
        let lo = run.start.max(self.start);
        let hi = run.end().min(self.end);
        if hi <= lo {
            // no more overlap: runs are ordered, nothing later can intersect
            self.cursor.next = self.cursor.runs.len();
            return None;
        }
        Some(ClippedRun {
            owner: run.owner,
            start: lo,
            offset: lo - self.start,
            len: hi - lo,
        })
    }
}
