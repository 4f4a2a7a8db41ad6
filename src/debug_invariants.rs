//! Structural self-checks for the run index and the part registry.
//!
//! Checks are compiled in for debug builds and for release builds with the
//! `check-invariants` feature; otherwise [`DebugInvariants::debug_assert_invariants`]
//! is a no-op and only the explicit [`DebugInvariants::validate_invariants`]
//! call does any work.

use crate::mesh_error::MeshPartsError;

/// A structure whose internal consistency can be checked.
pub trait DebugInvariants {
    /// Validate invariants and return the first violation.
    fn validate_invariants(&self) -> Result<(), MeshPartsError>;

    /// Panic on the first violation when invariant checking is compiled in.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), std::any::type_name::<Self>());
    }
}

/// Run a fallible check and panic with `ctx` on error when invariant checking
/// is compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $ctx:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!("[invariants] {}: {}", $ctx, e);
        }
    };
}
