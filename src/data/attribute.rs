//! Named attribute arrays owned by a part.
//!
//! Cell attributes are appended in replay order through a write cursor;
//! point attributes are written at the local index of each point the part
//! uses. Both are rewound at the start of every time step so the same storage
//! is refilled instead of reallocated.

use crate::data::scalar::{ScalarArray, ScalarType, StreamScalar};
use crate::mesh_error::MeshPartsError;

/// One property extracted from interleaved per-cell tuples.
#[derive(Clone, Debug, PartialEq)]
pub struct CellAttribute {
    name: String,
    /// Position of the first component inside each cell tuple.
    offset: usize,
    num_comps: usize,
    values: ScalarArray,
    written: usize,
}

impl CellAttribute {
    pub(crate) fn new(name: &str, offset: usize, num_comps: usize, ty: ScalarType, cells: usize) -> Self {
        Self {
            name: name.to_owned(),
            offset,
            num_comps,
            values: ScalarArray::zeros(ty, cells * num_comps),
            written: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    /// Values, `num_comps` per cell.
    pub fn values(&self) -> &ScalarArray {
        &self.values
    }

    /// Cells filled since the last rewind.
    pub fn written_cells(&self) -> usize {
        self.written
    }

    pub(crate) fn rewind(&mut self) {
        self.written = 0;
    }

    /// Extracts this attribute from `num_cells` tuples of `tuple_len` values.
    pub(crate) fn append_cells<T: StreamScalar>(
        &mut self,
        tuples: &[T],
        num_cells: usize,
        tuple_len: usize,
    ) -> Result<(), MeshPartsError> {
        if self.offset + self.num_comps > tuple_len {
            return Err(MeshPartsError::BufferLengthMismatch {
                expected: self.offset + self.num_comps,
                found: tuple_len,
            });
        }
        let nc = self.num_comps;
        let needed = (self.written + num_cells) * nc;
        if self.values.len() < needed {
            self.values.resize(needed);
        }
        let dst = self.values.as_mut_slice::<T>()?;
        for (c, tuple) in tuples.chunks_exact(tuple_len).take(num_cells).enumerate() {
            let at = (self.written + c) * nc;
            dst[at..at + nc].copy_from_slice(&tuple[self.offset..self.offset + nc]);
        }
        self.written += num_cells;
        Ok(())
    }
}

/// A per-point array restricted to the points a part uses.
#[derive(Clone, Debug, PartialEq)]
pub struct PointAttribute {
    name: String,
    num_comps: usize,
    is_property: bool,
    is_geometry: bool,
    values: ScalarArray,
    delivered: usize,
}

impl PointAttribute {
    pub(crate) fn new(
        name: &str,
        num_comps: usize,
        is_property: bool,
        is_geometry: bool,
        ty: ScalarType,
        points: usize,
    ) -> Self {
        Self {
            name: name.to_owned(),
            num_comps,
            is_property,
            is_geometry,
            values: ScalarArray::zeros(ty, points * num_comps),
            delivered: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    /// Whether this is a generic per-point property (as opposed to a
    /// geometry-only read).
    pub fn is_property(&self) -> bool {
        self.is_property
    }

    /// Whether this array holds the point coordinates.
    pub fn is_geometry(&self) -> bool {
        self.is_geometry
    }

    /// Values, `num_comps` per local point.
    pub fn values(&self) -> &ScalarArray {
        &self.values
    }

    /// Point tuples delivered since the last rewind.
    pub fn delivered_points(&self) -> usize {
        self.delivered
    }

    pub(crate) fn rewind(&mut self) {
        self.delivered = 0;
    }

    /// Copies the tuple of global point `global` out of a chunk that starts at
    /// global id `chunk_start`, into local point `local`.
    pub(crate) fn write_from_chunk<T: StreamScalar>(
        &mut self,
        chunk: &[T],
        chunk_start: u64,
        pairs: impl Iterator<Item = (usize, u64)>,
    ) -> Result<(), MeshPartsError> {
        let nc = self.num_comps;
        let dst = self.values.as_mut_slice::<T>()?;
        let mut n = 0;
        for (local, global) in pairs {
            let src = (global - chunk_start) as usize * nc;
            dst[local * nc..(local + 1) * nc].copy_from_slice(&chunk[src..src + nc]);
            n += 1;
        }
        self.delivered += n;
        Ok(())
    }
}
