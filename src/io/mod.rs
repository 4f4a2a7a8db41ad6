//! Word-stream I/O boundary.
//!
//! This module defines the sequential collaborator that actually touches the
//! bytes of a state file family. Everything above it only ever *skips* or
//! *buffers* words in file order; there is no random access, so a call issued
//! out of order corrupts every subsequent read, and a failed skip or read
//! leaves the position undefined (callers never retry).

pub mod memory;
pub mod metadata;

pub use memory::{SliceStream, StreamStats};
pub use metadata::{MeshMetadata, PartDescriptor};

use crate::data::scalar::StreamScalar;
use crate::mesh_error::MeshPartsError;

/// Width of one word in the stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WordSize {
    /// Single precision: `f32` / `i32`.
    Four,
    /// Double precision: `f64` / `i64`.
    Eight,
}

impl WordSize {
    /// Number of bytes per word.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            WordSize::Four => 4,
            WordSize::Eight => 8,
        }
    }
}

impl TryFrom<u8> for WordSize {
    type Error = MeshPartsError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        match bytes {
            4 => Ok(WordSize::Four),
            8 => Ok(WordSize::Eight),
            other => Err(MeshPartsError::MetadataParse(format!(
                "word size must be 4 or 8, got {other}"
            ))),
        }
    }
}

impl From<WordSize> for u8 {
    fn from(size: WordSize) -> u8 {
        size.bytes() as u8
    }
}

/// How the words of a buffered range are to be interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WordKind {
    /// Integers.
    Int,
    /// Floating-point values.
    Float,
}

/// Sequential, buffered access to a word-oriented binary stream.
///
/// Two buffering styles exist:
/// - *chunked reads*: [`begin_chunked_read`](Self::begin_chunked_read)
///   announces a range of elements and the stream picks the chunk size;
///   each [`next_chunk`](Self::next_chunk) loads the next piece.
/// - *fixed chunks*: [`buffer_chunk`](Self::buffer_chunk) loads exactly the
///   requested number of words.
///
/// In both cases [`buffer_as`](Self::buffer_as) views the current buffer and
/// [`clear_buffer`](Self::clear_buffer) releases it.
pub trait WordStream {
    /// Width of the stream's words.
    fn word_size(&self) -> WordSize;

    /// Advances past `count` words without reading them.
    fn skip_words(&mut self, count: u64) -> Result<(), MeshPartsError>;

    /// Announces a chunked read of `total_elements` elements of
    /// `words_per_element` words each. Returns the number of chunks.
    fn begin_chunked_read(
        &mut self,
        kind: WordKind,
        total_elements: u64,
        words_per_element: usize,
    ) -> Result<usize, MeshPartsError>;

    /// Loads the next chunk of the pending chunked read and returns the number
    /// of *elements* it holds.
    fn next_chunk(&mut self) -> Result<usize, MeshPartsError>;

    /// Loads exactly `words` words into the buffer.
    fn buffer_chunk(&mut self, kind: WordKind, words: usize) -> Result<(), MeshPartsError>;

    /// Views the current buffer as elements of `T`.
    fn buffer_as<T: StreamScalar>(&self) -> Result<&[T], MeshPartsError>;

    /// Drops the buffer's contents and releases its memory.
    fn clear_buffer(&mut self);
}
