#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-parts
//!
//! mesh-parts splits one sequential, word-oriented mesh stream (the state
//! files of an explicit finite-element solver) into independent *parts*, one
//! per material, without holding whole arrays in memory.
//!
//! ## Features
//! - A run-length cell index recording which part owns each contiguous run of
//!   cells, per cell category
//! - Exact per-part storage reservation and a replay cursor that re-walks the
//!   index while the connectivity is read a second time
//! - Skip/read/skip planning for partial cell windows
//! - A bounded-memory point windower handing each part only the point tuples
//!   it uses
//! - An in-memory [`SliceStream`](io::SliceStream) implementing the
//!   [`WordStream`](io::WordStream) boundary for tests and small files
//!
//! ## Protocol
//!
//! A [`PartCollection`](collection::PartCollection) is driven through
//! build → allocate → replay → finalize, then any number of state blocks. The
//! [`Phase`](collection::Phase) enum tracks the stage; operations issued out
//! of order fail with [`MeshPartsError::OutOfPhase`](mesh_error::MeshPartsError::OutOfPhase).
//!
//! ## Determinism
//!
//! All randomized tests use `SmallRng` with fixed seeds so runs are
//! reproducible.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-parts = "0.1"
//! # Optional features:
//! # features = ["check-invariants"]
//! ```

pub mod algs;
pub mod collection;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::plan::{IdWindows, ReadPlan};
    pub use crate::algs::point_window::{PartRange, PointWindow, SortedParts};
    pub use crate::collection::{CollectionOptions, PartCollection, Phase, PointRequest};
    pub use crate::data::part::Part;
    pub use crate::data::registry::{FinalizeSummary, PartRegistry};
    pub use crate::data::scalar::{ScalarArray, ScalarType, StreamScalar};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::{MeshMetadata, SliceStream, WordKind, WordSize, WordStream};
    pub use crate::mesh_error::MeshPartsError;
    pub use crate::topology::category::Category;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::run_index::{Run, RunIndex};
    pub use crate::topology::slot::PartSlot;
}
