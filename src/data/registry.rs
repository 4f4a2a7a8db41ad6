//! PartRegistry: the arena owning every part, indexed by dense slot.
//!
//! A slot is either occupied by a live [`Part`] or empty. Empty slots stand
//! for disabled parts (and, after [`finalize`](PartRegistry::finalize), for
//! parts that never received a cell); there is no placeholder part.
//!
//! Iteration state lives in the returned [`PartIter`] handle, so several
//! iterations over the same registry can be in flight and a new one can be
//! started at any time.

use log::debug;

use crate::data::part::Part;
use crate::debug_invariants::DebugInvariants;
use crate::io::WordSize;
use crate::mesh_error::MeshPartsError;
use crate::topology::category::Category;
use crate::topology::run_index::RunIndex;
use crate::topology::slot::PartSlot;

/// Outcome of [`PartRegistry::finalize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FinalizeSummary {
    /// Parts whose topology was built.
    pub built: usize,
    /// Parts dropped for having no cells.
    pub dropped: usize,
}

/// Fixed-size arena of parts.
#[derive(Clone, Debug, Default)]
pub struct PartRegistry {
    slots: Vec<Option<Part>>,
}

impl PartRegistry {
    /// A registry of `len` empty slots.
    pub fn with_slots(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
        }
    }

    /// Number of slots, occupied or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Creates a part at `slot`.
    ///
    /// # Errors
    /// - [`MeshPartsError::SlotOutOfRange`] if `slot` is beyond the registry.
    /// - [`MeshPartsError::SlotOccupied`] if a part already lives there.
    pub fn construct(
        &mut self,
        slot: PartSlot,
        category: Category,
        name: &str,
        material_id: i64,
        global_node_count: u64,
        word_size: WordSize,
    ) -> Result<&mut Part, MeshPartsError> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot.index())
            .ok_or(MeshPartsError::SlotOutOfRange { slot, len })?;
        if entry.is_some() {
            return Err(MeshPartsError::SlotOccupied(slot));
        }
        Ok(entry.insert(Part::new(
            slot,
            category,
            name,
            material_id,
            global_node_count,
            word_size,
        )))
    }

    /// Whether `slot` holds a part; `false` for out-of-range slots.
    #[inline]
    pub fn exists(&self, slot: PartSlot) -> bool {
        self.get(slot).is_some()
    }

    #[inline]
    pub fn get(&self, slot: PartSlot) -> Option<&Part> {
        self.slots.get(slot.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, slot: PartSlot) -> Option<&mut Part> {
        self.slots.get_mut(slot.index()).and_then(Option::as_mut)
    }

    /// Parts of `category` in increasing slot order.
    pub fn iter(&self, category: Category) -> PartIter<'_> {
        PartIter {
            slots: &self.slots,
            next: 0,
            category,
        }
    }

    /// Mutable parts of `category` in increasing slot order.
    pub fn iter_mut(&mut self, category: Category) -> impl Iterator<Item = &mut Part> + '_ {
        self.slots
            .iter_mut()
            .flatten()
            .filter(move |p| p.category() == category)
    }

    /// Every part in increasing slot order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> + '_ {
        self.slots.iter().flatten()
    }

    /// Reserves, for every part, the cells and connectivity of all the runs
    /// it owns across all categories.
    pub fn allocate_storage(&mut self, index: &RunIndex) {
        for part in self.slots.iter_mut().flatten() {
            let totals = index.totals_for(part.slot());
            part.allocate_cells(totals);
        }
    }

    /// Drops parts without cells and builds the topology of the others.
    pub fn finalize(&mut self) -> Result<FinalizeSummary, MeshPartsError> {
        let mut summary = FinalizeSummary::default();
        for entry in &mut self.slots {
            let Some(part) = entry else { continue };
            if part.has_cells() {
                part.build_topology()?;
                summary.built += 1;
                continue;
            }
            debug!("dropping part {} ({}): no cells", part.slot(), part.name());
            *entry = None;
            summary.dropped += 1;
        }
        Ok(summary)
    }

    /// Forgets every replayed cell so the replay pass can start over.
    pub fn clear_cells(&mut self) {
        for part in self.slots.iter_mut().flatten() {
            part.clear_cells();
        }
    }

    /// Turns off deletion tracking on every part that has cells.
    pub fn disable_dead_cells(&mut self) {
        for part in self.slots.iter_mut().flatten().filter(|p| p.has_cells()) {
            part.disable_dead_cells();
        }
    }

    /// Rewinds the per-step state of every part.
    pub fn reset_time_step(&mut self) {
        for part in self.slots.iter_mut().flatten() {
            part.reset_time_step();
        }
    }
}

/// Single-pass iteration over the parts of one category.
#[derive(Clone, Debug)]
pub struct PartIter<'a> {
    slots: &'a [Option<Part>],
    next: usize,
    category: Category,
}

impl<'a> Iterator for PartIter<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<&'a Part> {
        while let Some(entry) = self.slots.get(self.next) {
            self.next += 1;
            if let Some(part) = entry {
                if part.category() == self.category {
                    return Some(part);
                }
            }
        }
        None
    }
}

impl DebugInvariants for PartRegistry {
    fn validate_invariants(&self) -> Result<(), MeshPartsError> {
        for (i, entry) in self.slots.iter().enumerate() {
            if let Some(part) = entry {
                if part.slot().index() != i {
                    return Err(MeshPartsError::MetadataMismatch(format!(
                        "part {} stored at slot {i}",
                        part.slot()
                    )));
                }
            }
        }
        Ok(())
    }
}
