//! Re-export public algorithms.

pub mod plan;
pub mod point_window;

pub use plan::{IdWindows, ReadPlan};
pub use point_window::{PartRange, PointWindow, SortedParts};
