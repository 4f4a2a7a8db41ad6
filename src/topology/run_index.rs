//! Run-length index from global cell positions to owning parts.
//!
//! Cells of one category appear in the same order in the connectivity block
//! and in every state block, so the only thing that has to be remembered
//! between the two is *which part* owns each position. Consecutive cells of
//! the same part collapse into one [`Run`], which keeps the index proportional
//! to the number of part switches rather than the number of cells.
//!
//! # Invariants
//!
//! For every category:
//! - the first run starts at position 0,
//! - every run has `count > 0`,
//! - `runs[i + 1].start == runs[i].start + runs[i].count` (no gaps, no overlap),
//! - adjacent runs have different owners (runs are maximal).
//!
//! A part may still own several non-adjacent runs; totals for a part are
//! therefore always computed over *all* runs.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshPartsError;
use crate::topology::category::Category;
use crate::topology::slot::PartSlot;

/// A maximal span of one category's stream owned by one part, or by nobody.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Global position of the first cell.
    pub start: u64,
    /// Number of cells, always `> 0`.
    pub count: u64,
    /// Sum of the connectivity lengths of the cells.
    pub connectivity_len: u64,
    /// Receiving part; `None` for cells of disabled parts.
    pub owner: Option<PartSlot>,
}

impl Run {
    /// One past the last global position of the run.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.count
    }
}

/// Per-part sizes accumulated over every run it owns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellTotals {
    /// Number of cells.
    pub cells: u64,
    /// Total connectivity entries.
    pub connectivity_len: u64,
}

/// Ordered runs for every category.
#[derive(Clone, Debug, Default)]
pub struct RunIndex {
    runs: [Vec<Run>; Category::COUNT],
}

impl RunIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one cell to the stream of `category`.
    ///
    /// Extends the last run when it has the same owner, otherwise starts a new
    /// run at the previous run's end. Cells of disabled parts register with
    /// `owner == None` so that positions stay aligned with the stream.
    ///
    /// # Complexity
    /// **O(1)** amortized.
    pub fn register_cell(&mut self, category: Category, owner: Option<PartSlot>, conn_len: u64) {
        let runs = &mut self.runs[category.index()];
        if let Some(last) = runs.last_mut() {
            if last.owner == owner {
                last.count += 1;
                last.connectivity_len += conn_len;
                return;
            }
        }
        let start = runs.last().map_or(0, Run::end);
        runs.push(Run {
            start,
            count: 1,
            connectivity_len: conn_len,
            owner,
        });
    }

    /// Runs of `category` in stream order.
    #[inline]
    pub fn runs(&self, category: Category) -> &[Run] {
        &self.runs[category.index()]
    }

    /// Number of cells registered for `category`.
    pub fn cell_count(&self, category: Category) -> u64 {
        self.runs(category).last().map_or(0, Run::end)
    }

    /// Total connectivity entries registered for `category`.
    pub fn connectivity_len(&self, category: Category) -> u64 {
        self.runs(category).iter().map(|r| r.connectivity_len).sum()
    }

    /// Whether no cell has been registered in any category.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Vec::is_empty)
    }

    /// Sums every run of every category owned by `slot`.
    ///
    /// # Complexity
    /// **O(total runs)**.
    pub fn totals_for(&self, slot: PartSlot) -> CellTotals {
        self.runs
            .iter()
            .flatten()
            .filter(|r| r.owner == Some(slot))
            .fold(CellTotals::default(), |acc, r| CellTotals {
                cells: acc.cells + r.count,
                connectivity_len: acc.connectivity_len + r.connectivity_len,
            })
    }
}

impl DebugInvariants for RunIndex {
    fn validate_invariants(&self) -> Result<(), MeshPartsError> {
        for category in Category::ALL {
            let mut expected_start = 0;
            let mut prev_owner = None;
            for (i, run) in self.runs(category).iter().enumerate() {
                let invalid = |reason| MeshPartsError::InvalidRun {
                    category,
                    run: i,
                    reason,
                };
                if run.count == 0 {
                    return Err(invalid("empty run"));
                }
                if run.start != expected_start {
                    return Err(invalid("gap or overlap with previous run"));
                }
                if i > 0 && prev_owner == Some(run.owner) {
                    return Err(invalid("same owner as previous run"));
                }
                expected_start = run.end();
                prev_owner = Some(run.owner);
            }
        }
        Ok(())
    }
}
