//! Cell kinds delivered to parts during replay.

use crate::topology::category::Category;

/// Linear cell kinds appearing in d3plot-style connectivity blocks.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 0D particle.
    #[default]
    Vertex,
    /// 1D beam.
    Segment,
    /// Degenerate shell.
    Triangle,
    /// Shell or road segment.
    Quadrilateral,
    /// Degenerate solid.
    Tetrahedron,
    /// Degenerate solid.
    Prism,
    /// Degenerate solid.
    Pyramid,
    /// Solid or thick shell.
    Hexahedron,
}

impl CellType {
    /// Number of vertices in the cell's connectivity.
    pub fn vertex_count(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral | CellType::Tetrahedron => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }

    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Prism | CellType::Pyramid | CellType::Hexahedron => 3,
        }
    }

    /// Canonical kind for a connectivity of `len` points in `category`.
    ///
    /// Returns `None` when the category never produces cells of that length.
    pub fn for_category_and_len(category: Category, len: usize) -> Option<Self> {
        match (category, len) {
            (Category::Particle, 1) => Some(CellType::Vertex),
            (Category::Beam, 2) => Some(CellType::Segment),
            (Category::Shell | Category::RigidBody | Category::RoadSurface, 3) => {
                Some(CellType::Triangle)
            }
            (Category::Shell | Category::RigidBody | Category::RoadSurface, 4) => {
                Some(CellType::Quadrilateral)
            }
            (Category::ThickShell, 8) => Some(CellType::Hexahedron),
            (Category::Solid, 4) => Some(CellType::Tetrahedron),
            (Category::Solid, 5) => Some(CellType::Pyramid),
            (Category::Solid | Category::ThickShell, 6) => Some(CellType::Prism),
            (Category::Solid, 8) => Some(CellType::Hexahedron),
            _ => None,
        }
    }
}
