//! Cell categories of a d3plot-style mesh stream.
//!
//! Every category owns its own global, part-agnostic position stream: the
//! `n`-th solid in the connectivity block is the `n`-th solid in every state
//! block that carries per-solid data.

use std::fmt;

/// Coarse kind of mesh cell sharing one global position stream.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Category {
    /// Smoothed-particle cells (one point each).
    Particle,
    /// Two-node beams.
    Beam,
    /// Four-node shells.
    Shell,
    /// Eight-node thick shells.
    ThickShell,
    /// Eight-node solids.
    Solid,
    /// Rigid-body shells.
    RigidBody,
    /// Rigid road surface segments; their points live in a separate node set.
    RoadSurface,
}

impl Category {
    /// Number of categories; sizes every per-category table.
    pub const COUNT: usize = 7;

    /// All categories in stream order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Particle,
        Category::Beam,
        Category::Shell,
        Category::ThickShell,
        Category::Solid,
        Category::RigidBody,
        Category::RoadSurface,
    ];

    /// Categories whose parts share the geometry node array.
    pub const GEOMETRY: [Category; 5] = [
        Category::Particle,
        Category::Beam,
        Category::Shell,
        Category::ThickShell,
        Category::Solid,
    ];

    /// Dense index of this category into per-category tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether parts of this category take part in geometry point reads.
    pub fn uses_geometry_points(self) -> bool {
        Self::GEOMETRY.contains(&self)
    }

    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Particle => "particle",
            Category::Beam => "beam",
            Category::Shell => "shell",
            Category::ThickShell => "thick_shell",
            Category::Solid => "solid",
            Category::RigidBody => "rigid_body",
            Category::RoadSurface => "road_surface",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
