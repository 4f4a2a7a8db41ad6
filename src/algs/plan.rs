//! Partial-range planning for sequential per-cell arrays.
//!
//! When only a window `[min, max)` of a category's cells is wanted, every
//! per-cell array of that category (ids, deletion flags, property tuples) is
//! read as *skip · read · skip*. [`ReadPlan`] holds the three counts.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::io::MeshMetadata;
use crate::topology::category::Category;

/// How many leading positions to skip, read and trailing positions to skip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPlan {
    /// Positions to read.
    pub count: u64,
    /// Positions to skip before reading.
    pub skip_start: u64,
    /// Positions to skip after reading.
    pub skip_end: u64,
}

impl ReadPlan {
    /// Plans the read of `[requested_min, requested_max)` out of `total`.
    ///
    /// The window is first clamped to `[0, total)`. An empty or inverted
    /// window skips the whole category: `count = 0, skip_start = total,
    /// skip_end = 0`. Every plan satisfies
    /// `skip_start + count + skip_end == total`.
    pub fn new(requested_min: u64, requested_max: u64, total: u64) -> Self {
        let lo = requested_min.min(total);
        let hi = requested_max.min(total);
        if hi <= lo {
            return Self {
                count: 0,
                skip_start: total,
                skip_end: 0,
            };
        }
        Self {
            count: hi - lo,
            skip_start: lo,
            skip_end: total - hi,
        }
    }

    /// Positions covered by the plan.
    pub fn total(&self) -> u64 {
        self.skip_start + self.count + self.skip_end
    }

    /// Whether nothing is read.
    pub fn is_skip_only(&self) -> bool {
        self.count == 0
    }
}

/// Requested `[min, max)` cell window per category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdWindows {
    min: [u64; Category::COUNT],
    max: [u64; Category::COUNT],
}

impl IdWindows {
    /// Every cell of every category.
    pub fn full(meta: &MeshMetadata) -> Self {
        Self {
            min: [0; Category::COUNT],
            max: meta.number_of_cells,
        }
    }

    /// Windows from optional bound tables; a missing table means "from 0" or
    /// "to the category's end".
    pub fn from_bounds(
        meta: &MeshMetadata,
        mins: Option<[u64; Category::COUNT]>,
        maxs: Option<[u64; Category::COUNT]>,
    ) -> Self {
        Self {
            min: mins.unwrap_or([0; Category::COUNT]),
            max: maxs.unwrap_or(meta.number_of_cells),
        }
    }

    /// Restricts `category` to `range`.
    pub fn with_window(mut self, category: Category, range: Range<u64>) -> Self {
        self.min[category.index()] = range.start;
        self.max[category.index()] = range.end;
        self
    }

    /// Requested window of `category`.
    pub fn window(&self, category: Category) -> Range<u64> {
        self.min[category.index()]..self.max[category.index()]
    }

    /// Read plan of `category` given its stream length.
    pub fn plan(&self, category: Category, total: u64) -> ReadPlan {
        let w = self.window(category);
        ReadPlan::new(w.start, w.end, total)
    }
}
