//! Part: the cells and point data of one material.
//!
//! A part receives its cells one at a time during replay, in global stream
//! order, and remembers them with *global* point ids. Once every cell has been
//! seen, [`Part::build_topology`] collects the sorted set of global points it
//! uses; from then on point attributes are stored per local point and cell
//! attributes per local cell.
//!
//! The global point range `[min, max)` is tracked while cells arrive. The
//! point windower uses it to decide which chunks of a point array a part has
//! to look at.

use std::ops::Range;

use hashbrown::HashMap;

use crate::data::attribute::{CellAttribute, PointAttribute};
use crate::data::scalar::{ScalarType, StreamScalar};
use crate::io::WordSize;
use crate::mesh_error::MeshPartsError;
use crate::topology::category::Category;
use crate::topology::cell_type::CellType;
use crate::topology::run_index::CellTotals;
use crate::topology::slot::PartSlot;

/// Cells in insertion order, connectivity in global point ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStorage {
    types: Vec<CellType>,
    /// `offsets[i]..offsets[i + 1]` indexes `connectivity` for cell `i`.
    offsets: Vec<usize>,
    connectivity: Vec<u64>,
}

impl CellStorage {
    fn reserve_exact(&mut self, cells: usize, conn_len: usize) {
        self.types.reserve_exact(cells);
        self.offsets.reserve_exact(cells + 1);
        self.connectivity.reserve_exact(conn_len);
    }

    fn clear(&mut self) {
        self.types.clear();
        self.offsets.clear();
        self.connectivity.clear();
    }

    fn push(&mut self, ty: CellType, conn: &[u64]) {
        if self.offsets.is_empty() {
            self.offsets.push(0);
        }
        self.types.push(ty);
        self.connectivity.extend_from_slice(conn);
        self.offsets.push(self.connectivity.len());
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Cell kind of every cell, in insertion order.
    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    /// Global point ids of cell `i`.
    pub fn cell(&self, i: usize) -> Option<&[u64]> {
        let lo = *self.offsets.get(i)?;
        let hi = *self.offsets.get(i + 1)?;
        Some(&self.connectivity[lo..hi])
    }

    /// CSR offsets into [`connectivity`](Self::connectivity); one more than the cell count.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Concatenated global point ids of all cells.
    pub fn connectivity(&self) -> &[u64] {
        &self.connectivity
    }

    /// Reserved capacity as `(cells, connectivity)`.
    pub fn capacity(&self) -> (usize, usize) {
        (self.types.capacity(), self.connectivity.capacity())
    }
}

/// Local view built once all cells are known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartTopology {
    /// Sorted, unique global ids; position is the local point id.
    pub global_point_ids: Vec<u64>,
    /// Cell connectivity in local point ids, parallel to the global one.
    pub local_connectivity: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CellFlags<V> {
    values: Vec<V>,
    written: usize,
}

impl<V: Copy + Default> CellFlags<V> {
    fn push(&mut self, v: V) {
        match self.values.get_mut(self.written) {
            Some(slot) => *slot = v,
            None => self.values.push(v),
        }
        self.written += 1;
    }
}

/// A named subset of cells and points sharing a material.
#[derive(Clone, Debug)]
pub struct Part {
    slot: PartSlot,
    category: Category,
    name: String,
    material_id: i64,
    global_node_count: u64,
    word_size: WordSize,
    cells: CellStorage,
    allocated: CellTotals,
    point_range: Option<Range<u64>>,
    topology: Option<PartTopology>,
    dead_cells: Option<CellFlags<u8>>,
    user_ids: Option<CellFlags<i64>>,
    cell_attributes: Vec<CellAttribute>,
    cell_attribute_index: HashMap<String, usize>,
    point_attributes: Vec<PointAttribute>,
    point_attribute_index: HashMap<String, usize>,
    active_point_attribute: Option<usize>,
}

impl Part {
    /// A part with no cells yet.
    pub fn new(
        slot: PartSlot,
        category: Category,
        name: &str,
        material_id: i64,
        global_node_count: u64,
        word_size: WordSize,
    ) -> Self {
        Self {
            slot,
            category,
            name: name.to_owned(),
            material_id,
            global_node_count,
            word_size,
            cells: CellStorage::default(),
            allocated: CellTotals::default(),
            point_range: None,
            topology: None,
            dead_cells: None,
            user_ids: None,
            cell_attributes: Vec::new(),
            cell_attribute_index: HashMap::new(),
            point_attributes: Vec::new(),
            point_attribute_index: HashMap::new(),
            active_point_attribute: None,
        }
    }

    /// Slot this part occupies in the registry.
    pub fn slot(&self) -> PartSlot {
        self.slot
    }

    /// Cell category every cell of this part belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Display name from the metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User-facing part id from the metadata.
    pub fn material_id(&self) -> i64 {
        self.material_id
    }

    /// Size of the global node array this part indexes into.
    pub fn global_node_count(&self) -> u64 {
        self.global_node_count
    }

    /// Word size of the state arrays; selects `f32` or `f64` property storage.
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    /// Replayed cells with global connectivity.
    pub fn cells(&self) -> &CellStorage {
        &self.cells
    }

    /// Number of cells replayed into this part.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn has_cells(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Sizes reserved by [`allocate_cells`](Self::allocate_cells).
    pub fn allocated(&self) -> CellTotals {
        self.allocated
    }

    /// `[min, max)` of the global point ids referenced by this part's cells.
    pub fn global_point_range(&self) -> Option<Range<u64>> {
        self.point_range.clone()
    }

    /// Present once [`build_topology`](Self::build_topology) ran.
    pub fn topology(&self) -> Option<&PartTopology> {
        self.topology.as_ref()
    }

    /// Number of distinct points used; 0 before the topology is built.
    pub fn point_count(&self) -> usize {
        self.topology.as_ref().map_or(0, |t| t.global_point_ids.len())
    }

    /// Reserves exactly the cell storage the run index counted for this part.
    pub fn allocate_cells(&mut self, totals: CellTotals) {
        self.allocated = totals;
        self.cells
            .reserve_exact(totals.cells as usize, totals.connectivity_len as usize);
    }

    /// Drops every replayed cell and the point range, keeping the reservation.
    pub(crate) fn clear_cells(&mut self) {
        self.cells.clear();
        self.point_range = None;
    }

    /// Appends one cell with global point ids `conn`.
    pub fn add_cell(&mut self, ty: CellType, conn: &[u64]) {
        self.cells.push(ty, conn);
        let Some((&lo, &hi)) = conn.iter().min().zip(conn.iter().max()) else {
            return;
        };
        self.point_range = Some(match self.point_range.take() {
            Some(r) => r.start.min(lo)..r.end.max(hi + 1),
            None => lo..hi + 1,
        });
    }

    /// Collects the points used by the cells and renumbers connectivity locally.
    ///
    /// # Errors
    /// [`MeshPartsError::LocalIdOverflow`] when the part uses more points than
    /// a `u32` local id can address.
    pub fn build_topology(&mut self) -> Result<(), MeshPartsError> {
        let mut ids = self.cells.connectivity.clone();
        ids.sort_unstable();
        ids.dedup();
        check_local_id_range(self.slot, ids.len())?;
        let local_connectivity = self
            .cells
            .connectivity
            .iter()
            .map(|g| ids.partition_point(|x| x < g) as u32)
            .collect();
        self.topology = Some(PartTopology {
            global_point_ids: ids,
            local_connectivity,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Dead cells
    // ---------------------------------------------------------------------

    /// Starts tracking the deletion state of cells. Idempotent.
    pub fn enable_dead_cells(&mut self) {
        if self.dead_cells.is_none() {
            self.dead_cells = Some(CellFlags {
                values: vec![0; self.cells.len()],
                written: 0,
            });
        }
    }

    /// Appends the deletion state of the next `flags.len()` cells; nonzero means dead.
    pub fn set_cells_dead_state(&mut self, flags: &[u8]) {
        if let Some(dead) = &mut self.dead_cells {
            for &f in flags {
                dead.push(f);
            }
        }
    }

    /// Stops tracking deletion; every cell is reported alive.
    pub fn disable_dead_cells(&mut self) {
        self.dead_cells = None;
    }

    /// Per-cell deletion flags, if tracked.
    pub fn dead_cells(&self) -> Option<&[u8]> {
        self.dead_cells.as_ref().map(|d| d.values.as_slice())
    }

    /// Whether cell `i` is flagged as deleted.
    pub fn is_cell_dead(&self, i: usize) -> bool {
        self.dead_cells()
            .and_then(|d| d.get(i))
            .is_some_and(|&f| f != 0)
    }

    pub(crate) fn rewind_dead_cells(&mut self) {
        if let Some(dead) = &mut self.dead_cells {
            dead.written = 0;
        }
    }

    // ---------------------------------------------------------------------
    // User ids
    // ---------------------------------------------------------------------

    /// Starts storing user-facing cell ids. Idempotent.
    pub fn enable_cell_user_ids(&mut self) {
        if self.user_ids.is_none() {
            self.user_ids = Some(CellFlags {
                values: Vec::with_capacity(self.cells.len()),
                written: 0,
            });
        }
    }

    /// Stores the user id of the next cell.
    pub fn set_next_cell_user_id(&mut self, id: i64) {
        if let Some(ids) = &mut self.user_ids {
            ids.push(id);
        }
    }

    /// User-facing cell ids, if they were read.
    pub fn cell_user_ids(&self) -> Option<&[i64]> {
        self.user_ids.as_ref().map(|u| u.values.as_slice())
    }

    pub(crate) fn rewind_cell_user_ids(&mut self) {
        if let Some(ids) = &mut self.user_ids {
            ids.written = 0;
        }
    }

    // ---------------------------------------------------------------------
    // Cell properties
    // ---------------------------------------------------------------------

    /// Registers a property occupying `num_comps` values at `offset` inside
    /// every cell tuple. Registering an existing name rewinds it instead.
    pub fn add_cell_property(&mut self, name: &str, offset: usize, num_comps: usize) {
        if let Some(&i) = self.cell_attribute_index.get(name) {
            self.cell_attributes[i].rewind();
            return;
        }
        let ty = ScalarType::float_for(self.word_size);
        self.cell_attribute_index
            .insert(name.to_owned(), self.cell_attributes.len());
        self.cell_attributes
            .push(CellAttribute::new(name, offset, num_comps, ty, self.cells.len()));
    }

    /// Feeds `num_cells` tuples of `tuple_len` values to every cell property.
    pub fn read_cell_properties<T: StreamScalar>(
        &mut self,
        tuples: &[T],
        num_cells: usize,
        tuple_len: usize,
    ) -> Result<(), MeshPartsError> {
        if tuples.len() < num_cells * tuple_len {
            return Err(MeshPartsError::BufferLengthMismatch {
                expected: num_cells * tuple_len,
                found: tuples.len(),
            });
        }
        for attr in &mut self.cell_attributes {
            attr.append_cells(tuples, num_cells, tuple_len)?;
        }
        Ok(())
    }

    /// Cell property registered as `name`.
    pub fn cell_attribute(&self, name: &str) -> Option<&CellAttribute> {
        self.cell_attribute_index
            .get(name)
            .map(|&i| &self.cell_attributes[i])
    }

    /// Cell properties in registration order.
    pub fn cell_attributes(&self) -> &[CellAttribute] {
        &self.cell_attributes
    }

    // ---------------------------------------------------------------------
    // Point properties
    // ---------------------------------------------------------------------

    /// Registers a point array and makes it the target of subsequent
    /// [`read_point_based_property`](Self::read_point_based_property) calls.
    ///
    /// An existing array of the same name is reused (and rewound) when its
    /// component count matches, replaced otherwise.
    pub fn add_point_property(
        &mut self,
        name: &str,
        num_comps: usize,
        is_property: bool,
        is_geometry: bool,
    ) {
        let ty = ScalarType::float_for(self.word_size);
        let fresh = PointAttribute::new(name, num_comps, is_property, is_geometry, ty, self.point_count());
        let i = match self.point_attribute_index.get(name) {
            Some(&i) if self.point_attributes[i].num_comps() == num_comps => {
                self.point_attributes[i].rewind();
                i
            }
            Some(&i) => {
                self.point_attributes[i] = fresh;
                i
            }
            None => {
                self.point_attribute_index
                    .insert(name.to_owned(), self.point_attributes.len());
                self.point_attributes.push(fresh);
                self.point_attributes.len() - 1
            }
        };
        self.active_point_attribute = Some(i);
    }

    /// Copies, from a chunk covering global points
    /// `[chunk_start, chunk_start + num_tuples)`, the tuples of every point
    /// this part uses into the active point array.
    ///
    /// Points outside the chunk are left alone, so a part may be fed several
    /// consecutive chunks and receives each of its points exactly once.
    pub fn read_point_based_property<T: StreamScalar>(
        &mut self,
        chunk: &[T],
        num_tuples: usize,
        num_comps: usize,
        chunk_start: u64,
    ) -> Result<(), MeshPartsError> {
        let (Some(i), Some(topo)) = (self.active_point_attribute, &self.topology) else {
            return Ok(());
        };
        let attr = &mut self.point_attributes[i];
        if attr.num_comps() != num_comps {
            return Err(MeshPartsError::BufferLengthMismatch {
                expected: attr.num_comps(),
                found: num_comps,
            });
        }
        if chunk.len() < num_tuples * num_comps {
            return Err(MeshPartsError::BufferLengthMismatch {
                expected: num_tuples * num_comps,
                found: chunk.len(),
            });
        }
        let ids = &topo.global_point_ids;
        let chunk_end = chunk_start + num_tuples as u64;
        let lo = ids.partition_point(|&g| g < chunk_start);
        let hi = ids.partition_point(|&g| g < chunk_end);
        attr.write_from_chunk(chunk, chunk_start, (lo..hi).map(|l| (l, ids[l])))
    }

    /// Point property registered as `name`.
    pub fn point_attribute(&self, name: &str) -> Option<&PointAttribute> {
        self.point_attribute_index
            .get(name)
            .map(|&i| &self.point_attributes[i])
    }

    /// Point properties in registration order.
    pub fn point_attributes(&self) -> &[PointAttribute] {
        &self.point_attributes
    }

    /// The most recent geometry array, i.e. the point coordinates.
    pub fn coordinates(&self) -> Option<&PointAttribute> {
        self.point_attributes.iter().rev().find(|a| a.is_geometry())
    }

    /// Rewinds every per-step write cursor before a new state block.
    pub fn reset_time_step(&mut self) {
        self.rewind_dead_cells();
        self.rewind_cell_user_ids();
        for a in &mut self.cell_attributes {
            a.rewind();
        }
        for a in &mut self.point_attributes {
            a.rewind();
        }
        self.active_point_attribute = None;
    }
}

/// Local point ids are `u32`; a part may not use more points than that.
fn check_local_id_range(slot: PartSlot, points: usize) -> Result<(), MeshPartsError> {
    match u32::try_from(points) {
        Ok(_) => Ok(()),
        Err(_) => Err(MeshPartsError::LocalIdOverflow { slot, points }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_part() -> Part {
        Part::new(PartSlot::new(0), Category::Shell, "plate", 10, 100, WordSize::Four)
    }

    #[test]
    fn point_range_tracks_min_and_exclusive_max() {
        let mut p = shell_part();
        assert_eq!(p.global_point_range(), None);
        p.add_cell(CellType::Quadrilateral, &[5, 6, 9, 8]);
        p.add_cell(CellType::Quadrilateral, &[3, 4, 6, 5]);
        assert_eq!(p.global_point_range(), Some(3..10));
    }

    #[test]
    fn topology_renumbers_locally() {
        let mut p = shell_part();
        p.add_cell(CellType::Quadrilateral, &[5, 6, 9, 8]);
        p.add_cell(CellType::Triangle, &[9, 20, 5]);
        p.build_topology().unwrap();
        let topo = p.topology().unwrap();
        assert_eq!(topo.global_point_ids, vec![5, 6, 8, 9, 20]);
        assert_eq!(topo.local_connectivity, vec![0, 1, 3, 2, 3, 4, 0]);
        assert_eq!(p.cells().cell(1), Some(&[9, 20, 5][..]));
    }

    #[test]
    fn allocation_reserves_exact_sizes() {
        let mut p = shell_part();
        p.allocate_cells(CellTotals {
            cells: 3,
            connectivity_len: 12,
        });
        let (cells, conn) = p.cells().capacity();
        assert!(cells >= 3 && conn >= 12);
        assert_eq!(p.allocated().cells, 3);
    }

    #[test]
    fn point_property_from_two_chunks() {
        let mut p = shell_part();
        p.add_cell(CellType::Triangle, &[1, 4, 6]);
        p.build_topology().unwrap();
        p.add_point_property("coords", 1, false, true);
        // chunk [0, 5) then [5, 8)
        p.read_point_based_property(&[0.0f32, 10.0, 20.0, 30.0, 40.0], 5, 1, 0)
            .unwrap();
        p.read_point_based_property(&[50.0f32, 60.0, 70.0], 3, 1, 5).unwrap();
        let coords = p.coordinates().unwrap();
        assert_eq!(coords.values().as_slice::<f32>(), Some(&[10.0, 40.0, 60.0][..]));
        assert_eq!(coords.delivered_points(), 3);
    }

    #[test]
    fn dead_flags_and_user_ids_rewind_per_step() {
        let mut p = shell_part();
        p.add_cell(CellType::Triangle, &[0, 1, 2]);
        p.add_cell(CellType::Triangle, &[1, 2, 3]);
        p.enable_dead_cells();
        p.set_cells_dead_state(&[0, 1]);
        assert!(p.is_cell_dead(1) && !p.is_cell_dead(0));
        p.reset_time_step();
        p.set_cells_dead_state(&[1, 0]);
        assert_eq!(p.dead_cells(), Some(&[1, 0][..]));
        p.disable_dead_cells();
        assert!(!p.is_cell_dead(0));

        p.set_next_cell_user_id(7);
        assert_eq!(p.cell_user_ids(), None);
        p.enable_cell_user_ids();
        p.set_next_cell_user_id(7);
        p.set_next_cell_user_id(8);
        assert_eq!(p.cell_user_ids(), Some(&[7, 8][..]));
    }

    #[test]
    fn cell_property_type_follows_word_size() {
        let mut p = shell_part();
        p.add_cell(CellType::Triangle, &[0, 1, 2]);
        p.add_cell_property("thickness", 0, 1);
        assert_eq!(
            p.read_cell_properties(&[1.0f64], 1, 1),
            Err(MeshPartsError::ScalarTypeMismatch {
                expected: ScalarType::F64,
                found: ScalarType::F32
            })
        );
        p.read_cell_properties(&[1.5f32], 1, 1).unwrap();
        assert_eq!(
            p.cell_attribute("thickness").unwrap().values().as_slice::<f32>(),
            Some(&[1.5][..])
        );
    }

    #[test]
    fn clearing_cells_forgets_replay() {
        let mut p = shell_part();
        p.allocate_cells(CellTotals {
            cells: 1,
            connectivity_len: 3,
        });
        p.add_cell(CellType::Triangle, &[4, 5, 6]);
        p.clear_cells();
        assert_eq!(p.cell_count(), 0);
        assert_eq!(p.global_point_range(), None);
        p.add_cell(CellType::Triangle, &[1, 2, 3]);
        assert_eq!(p.cells().cell(0), Some(&[1, 2, 3][..]));
        assert_eq!(p.allocated().cells, 1);
    }

    #[test]
    fn local_ids_must_fit_u32() {
        let slot = PartSlot::new(3);
        assert!(check_local_id_range(slot, u32::MAX as usize).is_ok());
        assert_eq!(
            check_local_id_range(slot, u32::MAX as usize + 1),
            Err(MeshPartsError::LocalIdOverflow {
                slot,
                points: u32::MAX as usize + 1
            })
        );
    }
}
