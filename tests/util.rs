#![allow(dead_code)]
use mesh_parts::prelude::*;

/// Slot of 1-based material `n`.
pub fn slot(n: u32) -> PartSlot {
    PartSlot::from_material_number(n).unwrap()
}

/// Metadata with one part per `(category, enabled)` entry, material numbers
/// `1..=parts.len()` in order.
pub fn meta(
    parts: &[(Category, bool)],
    nodes: u64,
    cells: [u64; Category::COUNT],
    word_size: WordSize,
) -> MeshMetadata {
    MeshMetadata {
        part_materials: (1..=parts.len() as u32).collect(),
        part_ids: (0..parts.len() as i64).map(|i| 100 + i).collect(),
        part_status: parts.iter().map(|&(_, on)| on).collect(),
        part_types: parts.iter().map(|&(c, _)| c).collect(),
        part_names: (1..=parts.len()).map(|i| format!("part {i}")).collect(),
        number_of_nodes: nodes,
        number_of_cells: cells,
        word_size,
    }
}

/// Per-category cell totals of a cell list.
pub fn cell_totals(cells: &[(Category, u32, Vec<u64>)]) -> [u64; Category::COUNT] {
    let mut totals = [0; Category::COUNT];
    for (c, _, _) in cells {
        totals[c.index()] += 1;
    }
    totals
}

/// Cell type matching a connectivity length, falling back to the default.
pub fn cell_type(category: Category, len: usize) -> CellType {
    CellType::for_category_and_len(category, len).unwrap_or_default()
}

/// Runs both connectivity passes over `cells` (category, material, conn) and
/// finalizes the topology.
pub fn replay(collection: &mut PartCollection, cells: &[(Category, u32, Vec<u64>)]) {
    for (c, m, conn) in cells {
        collection
            .register_cell_to_part(*c, *m, conn.len() as u64)
            .unwrap();
    }
    collection.allocate_parts().unwrap();
    collection.init_cell_insertion().unwrap();
    for (c, _, conn) in cells {
        collection
            .insert_cell(*c, cell_type(*c, conn.len()), conn)
            .unwrap();
    }
    collection.finalize_topology().unwrap();
}

/// Collection over `meta` with every cell of `cells` replayed.
pub fn collection_with(
    meta: &MeshMetadata,
    options: CollectionOptions,
    cells: &[(Category, u32, Vec<u64>)],
) -> PartCollection {
    let mut c = PartCollection::with_options(meta, IdWindows::full(meta), options).unwrap();
    replay(&mut c, cells);
    c
}

/// `n` point tuples of `comps` components; component `k` of point `p` is
/// `p * 10 + k`.
pub fn point_array(n: u64, comps: usize) -> Vec<f32> {
    (0..n)
        .flat_map(|p| (0..comps).map(move |k| (p * 10 + k as u64) as f32))
        .collect()
}

/// Asserts that `part`'s point array `name` holds, for every local point, the
/// tuple [`point_array`] put at its global id.
pub fn assert_points_match(part: &Part, name: &str, comps: usize) {
    let attr = part.point_attribute(name).expect("point attribute");
    let values = attr.values().as_slice::<f32>().expect("f32 values");
    let ids = &part.topology().expect("topology").global_point_ids;
    assert_eq!(values.len(), ids.len() * comps);
    for (local, &g) in ids.iter().enumerate() {
        for k in 0..comps {
            assert_eq!(
                values[local * comps + k],
                (g * 10 + k as u64) as f32,
                "part {} point {g} comp {k}",
                part.slot()
            );
        }
    }
    assert_eq!(attr.delivered_points(), ids.len());
}
