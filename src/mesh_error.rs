//! MeshPartsError: Unified error type for mesh-parts public APIs
//!
//! Silent-by-construction behaviours (cells of disabled parts, existence
//! checks on out-of-range slots, clipped windows that no longer overlap) are
//! not errors and never surface here. Everything in this enum is either a
//! broken precondition of the build → allocate → replay → finalize protocol or
//! a failure reported by the word stream.

use thiserror::Error;

use crate::collection::Phase;
use crate::data::scalar::ScalarType;
use crate::io::WordKind;
use crate::topology::category::Category;
use crate::topology::slot::PartSlot;

/// Unified error type for mesh-parts operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshPartsError {
    /// Metadata material numbers are 1-based; 0 has no slot.
    #[error("material number must be 1-based (0 is reserved)")]
    InvalidMaterialNumber,
    /// A part was constructed twice at the same slot.
    #[error("part slot {0} is already occupied")]
    SlotOccupied(PartSlot),
    /// A slot index lies beyond the registry.
    #[error("part slot {slot} is out of range for a registry of {len} slots")]
    SlotOutOfRange { slot: PartSlot, len: usize },
    /// An operation was called out of the build/allocate/replay/finalize order.
    #[error("`{operation}` is not allowed in the {phase:?} phase")]
    OutOfPhase {
        operation: &'static str,
        phase: Phase,
    },
    /// More cells were replayed for a category than were registered.
    #[error("cell insertion for {0} ran past the end of the registered index")]
    InsertionOverrun(Category),
    /// A run was replayed with a different connectivity size than it was built with.
    #[error(
        "replay of {category} run {run} consumed {found} connectivity entries, registered {expected}"
    )]
    ReplayMismatch {
        category: Category,
        run: usize,
        expected: u64,
        found: u64,
    },
    /// Finalization was requested before every registered cell was replayed.
    #[error("replay of {category} stopped after {replayed} of {registered} cells")]
    IncompleteReplay {
        category: Category,
        replayed: u64,
        registered: u64,
    },
    /// A part's cell count after replay differs from the storage reserved for it.
    #[error("part {slot} received {found} cells during replay, {allocated} were indexed")]
    PartCountMismatch {
        slot: PartSlot,
        allocated: u64,
        found: u64,
    },
    /// A part uses more distinct points than local `u32` ids can number.
    #[error("part {slot} uses {points} points, more than local ids can address")]
    LocalIdOverflow { slot: PartSlot, points: usize },
    /// The run-length index violates its contiguity invariant.
    #[error("run {run} of {category} is invalid: {reason}")]
    InvalidRun {
        category: Category,
        run: usize,
        reason: &'static str,
    },
    /// A stored array was accessed with an element type it was not created with.
    #[error("scalar type mismatch: expected {expected:?}, found {found:?}")]
    ScalarTypeMismatch {
        expected: ScalarType,
        found: ScalarType,
    },
    /// A caller-supplied buffer is shorter than the element count it claims.
    #[error("buffer length mismatch: expected {expected}, found {found}")]
    BufferLengthMismatch { expected: usize, found: usize },
    /// The word stream cannot satisfy a skip or read.
    #[error("word stream exhausted: requested {requested} words, {available} remain")]
    StreamExhausted { requested: u64, available: u64 },
    /// The stream buffer cannot be reinterpreted as the requested element type.
    #[error("stream buffer cannot be viewed as {0:?}")]
    UnalignedBuffer(ScalarType),
    /// The stream buffer was loaded as one kind of word and viewed as another.
    #[error("stream buffer holds {buffered:?} words, viewed as {requested:?}")]
    BufferKindMismatch {
        buffered: WordKind,
        requested: ScalarType,
    },
    /// `next_chunk` was called without a pending chunked read.
    #[error("no chunked read is pending on the word stream")]
    NoChunkPending,
    /// Metadata vectors disagree with each other.
    #[error("metadata mismatch: {0}")]
    MetadataMismatch(String),
    /// Metadata could not be deserialized.
    #[error("metadata parse error: {0}")]
    MetadataParse(String),
}
