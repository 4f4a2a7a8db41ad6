//! Top-level module for cell-stream topology.
//!
//! This module provides the types that describe *where* cells live in the
//! global per-category streams and *who* owns them:
//! - [`Category`] and [`CellType`] for the kinds of cells,
//! - [`PartSlot`] as the handle through which everything refers to a part,
//! - the run-length [`RunIndex`] built during the first pass over the
//!   connectivity block,
//! - the cursors that replay it.

pub mod category;
pub mod cell_type;
pub mod cursor;
pub mod run_index;
pub mod slot;

pub use category::Category;
pub use cell_type::CellType;
pub use cursor::{ClippedRun, InsertionCursor, RunCursor};
pub use run_index::{CellTotals, Run, RunIndex};
pub use slot::PartSlot;
