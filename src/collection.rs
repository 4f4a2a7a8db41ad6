//! PartCollection: distributes one mesh stream to independent parts.
//!
//! The collection is driven by the reader in file order:
//!
//! 1. [`init_collection`](PartCollection::init_collection) builds the part
//!    registry from metadata.
//! 2. A first pass over the connectivity block calls
//!    [`register_cell_to_part`](PartCollection::register_cell_to_part) once
//!    per cell, building the run-length index.
//! 3. [`allocate_parts`](PartCollection::allocate_parts) reserves exact cell
//!    storage for every part.
//! 4. A second pass calls [`init_cell_insertion`](PartCollection::init_cell_insertion)
//!    and then [`insert_cell`](PartCollection::insert_cell) once per cell, in
//!    the same order as step 2.
//! 5. [`finalize_topology`](PartCollection::finalize_topology) drops empty
//!    parts and builds local topology.
//! 6. Every state block then distributes per-cell arrays (dead flags, user
//!    ids, properties) through the run index and per-point arrays through the
//!    point windower.
//!
//! Steps 2–5 are a strict protocol; calling an operation out of order is
//! reported as [`MeshPartsError::OutOfPhase`]. Cells and points of disabled
//! parts are always consumed from the stream and silently discarded.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::algs::plan::{IdWindows, ReadPlan};
use crate::algs::point_window::{PartRange, SortedParts};
use crate::data::part::Part;
use crate::data::registry::{FinalizeSummary, PartRegistry};
use crate::data::scalar::StreamScalar;
use crate::debug_invariants::DebugInvariants;
use crate::io::{MeshMetadata, WordKind, WordSize, WordStream};
use crate::mesh_error::MeshPartsError;
use crate::topology::category::Category;
use crate::topology::cell_type::CellType;
use crate::topology::cursor::{InsertionCursor, RunCursor};
use crate::topology::run_index::RunIndex;
use crate::topology::slot::PartSlot;

/// Number of point tuples the windower buffers at once.
pub const DEFAULT_POINT_CHUNK_LEN: u64 = 1_048_576;

/// Phases in which per-cell state data may be distributed.
const STATE_PHASES: &[Phase] = &[Phase::Allocated, Phase::Inserting, Phase::Finalized];

/// Stage of the build → allocate → replay → finalize protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Registering cells into the run index.
    Indexing,
    /// Storage reserved; replay not started.
    Allocated,
    /// Replaying cells into parts.
    Inserting,
    /// Topology built; only state data is accepted.
    Finalized,
}

/// Tunables of a [`PartCollection`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    /// Tuples per chunk when streaming point arrays.
    pub point_chunk_len: u64,
    /// Verify that replay reproduces the registered connectivity sizes and
    /// cell counts.
    pub strict_replay: bool,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            point_chunk_len: DEFAULT_POINT_CHUNK_LEN,
            strict_replay: true,
        }
    }
}

/// What a point array is, and therefore which parts want it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRequest {
    /// A generic per-point property the caller asked for.
    pub is_property: bool,
    /// The coordinates of the geometry nodes.
    pub is_geometry: bool,
    /// Data of the road-surface node set.
    pub is_road: bool,
}

impl PointRequest {
    /// Geometry coordinates.
    pub fn geometry() -> Self {
        Self {
            is_geometry: true,
            ..Self::default()
        }
    }

    /// A generic point property.
    pub fn property() -> Self {
        Self {
            is_property: true,
            ..Self::default()
        }
    }

    /// Road-surface points.
    pub fn road() -> Self {
        Self {
            is_road: true,
            ..Self::default()
        }
    }

    /// Whether anything has to be read at all.
    pub fn wants_read(&self) -> bool {
        self.is_property || self.is_geometry || self.is_road
    }

    fn categories(&self) -> &'static [Category] {
        if self.is_road {
            &[Category::RoadSurface]
        } else {
            &Category::GEOMETRY
        }
    }
}

/// Registry, run index and replay state of one mesh stream.
#[derive(Clone, Debug)]
pub struct PartCollection {
    registry: PartRegistry,
    index: RunIndex,
    windows: IdWindows,
    cells_per_category: [u64; Category::COUNT],
    word_size: WordSize,
    cursors: Option<[InsertionCursor; Category::COUNT]>,
    options: CollectionOptions,
    phase: Phase,
}

impl PartCollection {
    /// Collection over every cell of every category.
    pub fn new(meta: &MeshMetadata) -> Result<Self, MeshPartsError> {
        Self::init_collection(meta, None, None)
    }

    /// Collection restricted to `[mins[c], maxs[c])` per category; a missing
    /// table defaults to the full range.
    pub fn init_collection(
        meta: &MeshMetadata,
        mins: Option<[u64; Category::COUNT]>,
        maxs: Option<[u64; Category::COUNT]>,
    ) -> Result<Self, MeshPartsError> {
        Self::with_options(
            meta,
            IdWindows::from_bounds(meta, mins, maxs),
            CollectionOptions::default(),
        )
    }

    /// Collection with explicit windows and options.
    pub fn with_options(
        meta: &MeshMetadata,
        windows: IdWindows,
        options: CollectionOptions,
    ) -> Result<Self, MeshPartsError> {
        meta.validate()?;
        let mut registry = PartRegistry::with_slots(meta.part_count());
        for part in meta.parts().filter(|p| p.enabled) {
            registry.construct(
                PartSlot::from_material_number(part.material_number)?,
                part.category,
                part.name,
                part.material_id,
                meta.number_of_nodes,
                meta.word_size,
            )?;
        }
        debug!(
            "part collection: {} of {} parts enabled, {}-byte words",
            registry.active_count(),
            registry.len(),
            meta.word_size.bytes()
        );
        Ok(Self {
            registry,
            index: RunIndex::new(),
            windows,
            cells_per_category: meta.number_of_cells,
            word_size: meta.word_size,
            cursors: None,
            options,
            phase: Phase::Indexing,
        })
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), MeshPartsError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(MeshPartsError::OutOfPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    // ---------------------------------------------------------------------
    // Build → allocate → replay → finalize
    // ---------------------------------------------------------------------

    /// Records that the next cell of `category` belongs to material
    /// `material_number` (1-based) and has `conn_len` points.
    ///
    /// Cells of disabled materials are recorded without an owner.
    pub fn register_cell_to_part(
        &mut self,
        category: Category,
        material_number: u32,
        conn_len: u64,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("register_cell_to_part", &[Phase::Indexing])?;
        let slot = PartSlot::from_material_number(material_number)?;
        if slot.index() >= self.registry.len() {
            return Err(MeshPartsError::SlotOutOfRange {
                slot,
                len: self.registry.len(),
            });
        }
        let owner = self.registry.exists(slot).then_some(slot);
        self.index.register_cell(category, owner, conn_len);
        Ok(())
    }

    /// Reserves exact cell storage in every part from the finished index.
    pub fn allocate_parts(&mut self) -> Result<(), MeshPartsError> {
        self.expect_phase("allocate_parts", &[Phase::Indexing])?;
        self.index.debug_assert_invariants();
        self.registry.allocate_storage(&self.index);
        self.phase = Phase::Allocated;
        debug!(
            "allocated parts for {} indexed cells",
            Category::ALL
                .iter()
                .map(|&c| self.index.cell_count(c))
                .sum::<u64>()
        );
        Ok(())
    }

    /// Rewinds one replay cursor per category to the first run.
    ///
    /// Restarting a replay already in progress discards the cells delivered
    /// so far, so a full second pass reproduces the registered counts.
    pub fn init_cell_insertion(&mut self) -> Result<(), MeshPartsError> {
        self.expect_phase("init_cell_insertion", &[Phase::Allocated, Phase::Inserting])?;
        if self.phase == Phase::Inserting {
            debug!("restarting cell replay; discarding replayed cells");
            self.registry.clear_cells();
        }
        self.cursors = Some([InsertionCursor::begin(); Category::COUNT]);
        self.phase = Phase::Inserting;
        Ok(())
    }

    /// Replays the next cell of `category`: it goes to the part owning the
    /// current run, or nowhere if that part is disabled. The cursor advances
    /// by one cell either way.
    pub fn insert_cell(
        &mut self,
        category: Category,
        cell_type: CellType,
        conn: &[u64],
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("insert_cell", &[Phase::Inserting])?;
        let Some(cursors) = self.cursors.as_mut() else {
            return Err(MeshPartsError::OutOfPhase {
                operation: "insert_cell",
                phase: self.phase,
            });
        };
        let runs = self.index.runs(category);
        let cursor = &mut cursors[category.index()];
        let run = cursor
            .current(runs)
            .ok_or(MeshPartsError::InsertionOverrun(category))?;
        if let Some(part) = run.owner.and_then(|s| self.registry.get_mut(s)) {
            part.add_cell(cell_type, conn);
        }
        if let Some(done) = cursor.advance(runs, conn.len() as u64) {
            let expected = runs[done.run].connectivity_len;
            if self.options.strict_replay && done.connectivity_len != expected {
                return Err(MeshPartsError::ReplayMismatch {
                    category,
                    run: done.run,
                    expected,
                    found: done.connectivity_len,
                });
            }
        }
        Ok(())
    }

    /// Drops parts that received no cell and builds the topology of the rest.
    pub fn finalize_topology(&mut self) -> Result<FinalizeSummary, MeshPartsError> {
        self.expect_phase("finalize_topology", &[Phase::Allocated, Phase::Inserting])?;
        if self.options.strict_replay {
            for category in Category::ALL {
                let runs = self.index.runs(category);
                let registered = self.index.cell_count(category);
                let replayed = self
                    .cursors
                    .as_ref()
                    .map_or(0, |c| c[category.index()].position(runs));
                if replayed != registered {
                    return Err(MeshPartsError::IncompleteReplay {
                        category,
                        replayed,
                        registered,
                    });
                }
            }
            for part in self.registry.parts() {
                let found = part.cell_count() as u64;
                let allocated = part.allocated().cells;
                if found != allocated {
                    return Err(MeshPartsError::PartCountMismatch {
                        slot: part.slot(),
                        allocated,
                        found,
                    });
                }
            }
        }
        let summary = self.registry.finalize()?;
        self.registry.debug_assert_invariants();
        self.cursors = None;
        self.phase = Phase::Finalized;
        debug!(
            "finalized topology: {} parts built, {} empty parts dropped",
            summary.built, summary.dropped
        );
        Ok(summary)
    }

    // ---------------------------------------------------------------------
    // Per-cell state data
    // ---------------------------------------------------------------------

    /// Skip/read/skip counts of `category`'s per-cell arrays.
    pub fn read_plan(&self, category: Category) -> ReadPlan {
        self.windows
            .plan(category, self.cells_per_category[category.index()])
    }

    /// Splits a deletion-flag array covering the requested window of
    /// `category` between the parts; nonzero means dead.
    pub fn set_cell_dead_flags(
        &mut self,
        category: Category,
        dead: &[u8],
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("set_cell_dead_flags", STATE_PHASES)?;
        for part in self.registry.iter_mut(category) {
            part.enable_dead_cells();
            part.rewind_dead_cells();
        }
        let registered = self.index.cell_count(category);
        if (dead.len() as u64) < registered {
            warn!(
                "{category}: {} dead flags for {registered} indexed cells",
                dead.len()
            );
        }
        let runs = self.index.runs(category);
        for piece in RunCursor::starting_at(runs, 0).clipped(0, dead.len() as u64) {
            if let Some(part) = piece.owner.and_then(|s| self.registry.get_mut(s)) {
                part.enable_dead_cells();
                let lo = piece.offset as usize;
                part.set_cells_dead_state(&dead[lo..lo + piece.len as usize]);
            }
        }
        Ok(())
    }

    /// Registers a cell property on every part of `category`.
    pub fn add_cell_attribute(
        &mut self,
        category: Category,
        name: &str,
        offset: usize,
        num_comps: usize,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("add_cell_attribute", STATE_PHASES)?;
        for part in self.registry.iter_mut(category) {
            part.add_cell_property(name, offset, num_comps);
        }
        Ok(())
    }

    /// Distributes `count` cell tuples of `tuple_len` values, starting at
    /// window position `start` of `category`, to the owning parts.
    pub fn fill_cell_attribute<T: StreamScalar>(
        &mut self,
        buffer: &[T],
        category: Category,
        start: u64,
        count: u64,
        tuple_len: usize,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("fill_cell_attribute", STATE_PHASES)?;
        let needed = count as usize * tuple_len;
        if buffer.len() < needed {
            return Err(MeshPartsError::BufferLengthMismatch {
                expected: needed,
                found: buffer.len(),
            });
        }
        let runs = self.index.runs(category);
        for piece in RunCursor::starting_at(runs, start).clipped(start, count) {
            if let Some(part) = piece.owner.and_then(|s| self.registry.get_mut(s)) {
                let lo = piece.offset as usize * tuple_len;
                let len = piece.len as usize;
                part.read_cell_properties(&buffer[lo..lo + len * tuple_len], len, tuple_len)?;
            }
        }
        Ok(())
    }

    /// Streams `category`'s property block of `tuple_len` words per cell
    /// through the read plan and distributes it chunk by chunk.
    pub fn read_cell_attributes<S: WordStream>(
        &mut self,
        stream: &mut S,
        category: Category,
        tuple_len: usize,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("read_cell_attributes", STATE_PHASES)?;
        let plan = self.read_plan(category);
        let words = tuple_len as u64;
        stream.skip_words(plan.skip_start * words)?;
        if plan.count > 0 {
            let chunks = stream.begin_chunked_read(WordKind::Float, plan.count, tuple_len)?;
            let mut start = 0;
            for _ in 0..chunks {
                let n = stream.next_chunk()? as u64;
                match stream.word_size() {
                    WordSize::Four => {
                        self.fill_cell_attribute(stream.buffer_as::<f32>()?, category, start, n, tuple_len)?
                    }
                    WordSize::Eight => {
                        self.fill_cell_attribute(stream.buffer_as::<f64>()?, category, start, n, tuple_len)?
                    }
                }
                start += n;
            }
        }
        stream.skip_words(plan.skip_end * words)?;
        stream.clear_buffer();
        Ok(())
    }

    /// Reads `category`'s user cell ids, or skips them entirely when not
    /// `enabled`.
    pub fn read_cell_user_ids<S: WordStream>(
        &mut self,
        stream: &mut S,
        category: Category,
        enabled: bool,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("read_cell_user_ids", STATE_PHASES)?;
        let plan = self.read_plan(category);
        if !enabled {
            return stream.skip_words(plan.total());
        }
        for part in self.registry.iter_mut(category) {
            part.rewind_cell_user_ids();
        }
        stream.skip_words(plan.skip_start)?;
        if plan.count > 0 {
            let chunks = stream.begin_chunked_read(WordKind::Int, plan.count, 1)?;
            let mut start = 0;
            for _ in 0..chunks {
                let n = stream.next_chunk()? as u64;
                match stream.word_size() {
                    WordSize::Four => {
                        self.fill_cell_user_ids(stream.buffer_as::<i32>()?, category, start, n)?
                    }
                    WordSize::Eight => {
                        self.fill_cell_user_ids(stream.buffer_as::<i64>()?, category, start, n)?
                    }
                }
                start += n;
            }
        }
        stream.skip_words(plan.skip_end)?;
        stream.clear_buffer();
        Ok(())
    }

    /// Distributes `count` user ids starting at window position `start`.
    pub fn fill_cell_user_ids<T: StreamScalar>(
        &mut self,
        buffer: &[T],
        category: Category,
        start: u64,
        count: u64,
    ) -> Result<(), MeshPartsError> {
        self.expect_phase("fill_cell_user_ids", STATE_PHASES)?;
        let count = count.min(buffer.len() as u64);
        let runs = self.index.runs(category);
        for piece in RunCursor::starting_at(runs, start).clipped(start, count) {
            let Some(part) = piece.owner.and_then(|s| self.registry.get_mut(s)) else {
                continue;
            };
            part.enable_cell_user_ids();
            let lo = piece.offset as usize;
            for &id in &buffer[lo..lo + piece.len as usize] {
                part.set_next_cell_user_id(num_traits::cast(id).unwrap_or_default());
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Per-point state data
    // ---------------------------------------------------------------------

    /// Reads a point array of `num_tuples × num_comps` words and hands every
    /// interested part the tuples of the points it uses.
    ///
    /// Geometry and property arrays go to the particle, beam, shell,
    /// thick-shell and solid parts; road arrays to road-surface parts. An
    /// array nobody requested is skipped without being read. Only the window
    /// spanning the interested parts is buffered, one chunk at a time.
    pub fn read_point_attribute<S: WordStream>(
        &mut self,
        stream: &mut S,
        num_tuples: u64,
        num_comps: usize,
        name: &str,
        request: PointRequest,
    ) -> Result<(), MeshPartsError> {
        let words = num_tuples * num_comps as u64;
        if !request.wants_read() {
            return stream.skip_words(words);
        }
        self.expect_phase("read_point_attribute", &[Phase::Finalized])?;

        let mut ranges = Vec::new();
        for &category in request.categories() {
            for part in self.registry.iter_mut(category) {
                part.add_point_property(name, num_comps, request.is_property, request.is_geometry);
                if let Some(range) = part.global_point_range() {
                    ranges.push(PartRange::new(part.slot(), range));
                }
            }
        }
        match stream.word_size() {
            WordSize::Four => self.stream_point_window::<f32, S>(stream, ranges, num_tuples, num_comps),
            WordSize::Eight => self.stream_point_window::<f64, S>(stream, ranges, num_tuples, num_comps),
        }
    }

    fn stream_point_window<T: StreamScalar, S: WordStream>(
        &mut self,
        stream: &mut S,
        ranges: Vec<PartRange>,
        num_tuples: u64,
        num_comps: usize,
    ) -> Result<(), MeshPartsError> {
        let nc = num_comps as u64;
        let mut sorted = SortedParts::new(ranges);
        let Some(window) = sorted.window(num_tuples) else {
            return stream.skip_words(num_tuples * nc);
        };
        trace!(
            "point window [{}, {}) of {num_tuples} for {} parts",
            window.low,
            window.high,
            sorted.len()
        );
        stream.skip_words(window.skip_start * nc)?;
        for chunk in window.chunks(self.options.point_chunk_len) {
            let n = (chunk.end - chunk.start) as usize;
            stream.buffer_chunk(WordKind::Float, n * num_comps)?;
            let buf = stream.buffer_as::<T>()?;
            sorted.retire_before(chunk.start);
            for slot in sorted.overlapping(chunk.clone()) {
                if let Some(part) = self.registry.get_mut(slot) {
                    part.read_point_based_property(buf, n, num_comps, chunk.start)?;
                }
            }
        }
        stream.skip_words(window.skip_end * nc)?;
        stream.clear_buffer();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle and accessors
    // ---------------------------------------------------------------------

    /// Turns off deletion tracking on every part.
    pub fn disable_dead_cells(&mut self) {
        self.registry.disable_dead_cells();
    }

    /// Rewinds every part's per-step state before a new state block.
    pub fn reset_time_step(&mut self) {
        self.registry.reset_time_step();
    }

    /// Whether `slot` holds a part; `false` for out-of-range slots.
    pub fn is_active_part(&self, slot: PartSlot) -> bool {
        self.registry.exists(slot)
    }

    /// Number of part slots, enabled or not.
    pub fn part_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live parts.
    pub fn active_part_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Output of the part at `slot`.
    pub fn part(&self, slot: PartSlot) -> Option<&Part> {
        self.registry.get(slot)
    }

    /// Every live part in slot order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> + '_ {
        self.registry.parts()
    }

    /// The slot arena holding every live part.
    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    /// Run-length index built by [`register_cell_to_part`](Self::register_cell_to_part).
    pub fn run_index(&self) -> &RunIndex {
        &self.index
    }

    /// Current stage of the build → allocate → replay → finalize protocol.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Tunables this collection was built with.
    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Width of the state stream's words, from the metadata.
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }
}
