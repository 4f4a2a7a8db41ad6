//! Data module: parts and the arrays they own

pub mod attribute;
pub mod part;
pub mod registry;
pub mod scalar;

pub use attribute::{CellAttribute, PointAttribute};
pub use part::{CellStorage, Part, PartTopology};
pub use registry::{FinalizeSummary, PartIter, PartRegistry};
pub use scalar::{ScalarArray, ScalarType, StreamScalar};
