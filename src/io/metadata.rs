//! Part and stream metadata discovered before any cell is read.
//!
//! The discovery itself happens elsewhere; this is the serializable summary
//! that a [`PartCollection`](crate::collection::PartCollection) is built from.

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::io::WordSize;
use crate::mesh_error::MeshPartsError;
use crate::topology::category::Category;

/// Ordered per-part tables plus global counts.
///
/// The five `part_*` vectors are parallel: entry `i` of each describes the
/// same part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshMetadata {
    /// 1-based material number; the part lives at slot `number - 1`.
    pub part_materials: Vec<u32>,
    /// User-facing material id.
    pub part_ids: Vec<i64>,
    /// Whether the part is to be loaded.
    pub part_status: Vec<bool>,
    /// Cell category of the part.
    pub part_types: Vec<Category>,
    /// Display name.
    pub part_names: Vec<String>,
    /// Number of points in the geometry node array.
    pub number_of_nodes: u64,
    /// Number of cells in each category's stream.
    pub number_of_cells: [u64; Category::COUNT],
    /// Width of the words in the state stream.
    pub word_size: WordSize,
}

/// One row of the part tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartDescriptor<'a> {
    pub material_number: u32,
    pub material_id: i64,
    pub enabled: bool,
    pub category: Category,
    pub name: &'a str,
}

impl MeshMetadata {
    /// Parse metadata from JSON and validate it.
    pub fn from_json(text: &str) -> Result<Self, MeshPartsError> {
        let meta: MeshMetadata = serde_json::from_str(text)
            .map_err(|e| MeshPartsError::MetadataParse(e.to_string()))?;
        meta.validate()?;
        Ok(meta)
    }

    /// Number of part slots, enabled or not.
    pub fn part_count(&self) -> usize {
        self.part_materials.len()
    }

    /// Cells in `category`'s stream.
    pub fn cells_in(&self, category: Category) -> u64 {
        self.number_of_cells[category.index()]
    }

    /// Checks that the parallel tables agree and every material number maps
    /// to a slot.
    pub fn validate(&self) -> Result<(), MeshPartsError> {
        let n = self.part_materials.len();
        let lens = [
            ("part_ids", self.part_ids.len()),
            ("part_status", self.part_status.len()),
            ("part_types", self.part_types.len()),
            ("part_names", self.part_names.len()),
        ];
        for (name, len) in lens {
            if len != n {
                return Err(MeshPartsError::MetadataMismatch(format!(
                    "{name} has {len} entries, part_materials has {n}"
                )));
            }
        }
        if let Some(&bad) = self
            .part_materials
            .iter()
            .find(|&&m| m == 0 || m as usize > n)
        {
            return Err(MeshPartsError::MetadataMismatch(format!(
                "material number {bad} outside 1..={n}"
            )));
        }
        Ok(())
    }

    /// Rows of the part tables in metadata order.
    pub fn parts(&self) -> impl Iterator<Item = PartDescriptor<'_>> + '_ {
        izip!(
            &self.part_materials,
            &self.part_ids,
            &self.part_status,
            &self.part_types,
            &self.part_names
        )
        .map(|(&material_number, &material_id, &enabled, &category, name)| PartDescriptor {
            material_number,
            material_id,
            enabled,
            category,
            name,
        })
    }
}
