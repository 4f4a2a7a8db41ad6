//! `PartSlot`: a strong, zero-cost handle for a part's position in the registry
//!
//! Slots are dense and 0-based. Metadata numbers materials from 1, so the
//! conversion from a material number is the only fallible constructor.
//!
//! Runs in the cell index refer to parts only through a `PartSlot`; they never
//! hold the part itself, so a cleared slot can never leave a dangling owner.

use std::fmt;

use crate::mesh_error::MeshPartsError;

/// Dense index of a part inside a [`PartRegistry`](crate::data::registry::PartRegistry).
///
/// # Memory layout
/// `repr(transparent)` over `u32`, so `Option<PartSlot>` costs eight bytes
/// and slices of slots can be handed to code expecting `u32`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PartSlot(u32);

impl PartSlot {
    /// Wraps a raw 0-based slot index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        PartSlot(raw)
    }

    /// Converts a 1-based material number into its slot.
    ///
    /// # Errors
    /// Returns [`MeshPartsError::InvalidMaterialNumber`] for `0`.
    #[inline]
    pub fn from_material_number(number: u32) -> Result<Self, MeshPartsError> {
        number
            .checked_sub(1)
            .map(PartSlot)
            .ok_or(MeshPartsError::InvalidMaterialNumber)
    }

    /// Returns the raw slot index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the slot as a `usize` index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartSlot").field(&self.0).finish()
    }
}

impl fmt::Display for PartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(PartSlot, u32);
    assert_eq_align!(PartSlot, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_numbers_are_one_based() {
        assert_eq!(PartSlot::from_material_number(1), Ok(PartSlot::new(0)));
        assert_eq!(PartSlot::from_material_number(7).map(PartSlot::get), Ok(6));
        assert_eq!(
            PartSlot::from_material_number(0),
            Err(MeshPartsError::InvalidMaterialNumber)
        );
    }

    #[test]
    fn debug_and_display() {
        let s = PartSlot::new(3);
        assert_eq!(format!("{:?}", s), "PartSlot(3)");
        assert_eq!(format!("{}", s), "3");
    }

    #[test]
    fn json_roundtrip() {
        let s = PartSlot::new(11);
        let text = serde_json::to_string(&s).unwrap();
        assert_eq!(text, "11");
        let back: PartSlot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
    }
}
