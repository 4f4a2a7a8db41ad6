//! In-memory [`WordStream`] over a `bytes::Bytes` image.
//!
//! Used by tests and benchmarks in place of a file family. It honours the same
//! sequential contract as a disk-backed stream and additionally counts how
//! many words were read and skipped, so callers can check that I/O stays
//! proportional to what was requested.

use bytes::Bytes;

use crate::data::scalar::StreamScalar;
use crate::io::{WordKind, WordSize, WordStream};
use crate::mesh_error::MeshPartsError;

/// Default number of words a chunked read loads at once.
pub const DEFAULT_MAX_CHUNK_WORDS: usize = 1 << 20;

/// I/O counters of a [`SliceStream`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Words copied into the buffer.
    pub words_read: u64,
    /// Words passed over by `skip_words`.
    pub words_skipped: u64,
    /// Largest buffer held at any time, in words.
    pub peak_buffer_words: usize,
    /// Number of buffer loads.
    pub chunks_loaded: usize,
}

#[derive(Clone, Copy, Debug)]
struct PendingRead {
    kind: WordKind,
    remaining_elements: u64,
    words_per_element: usize,
    chunk_elements: u64,
}

/// Word stream reading from memory.
#[derive(Clone, Debug)]
pub struct SliceStream {
    data: Bytes,
    word_size: WordSize,
    /// Byte offset of the next unread word.
    pos: usize,
    /// `u64` backing keeps every view of the buffer aligned.
    buffer: Vec<u64>,
    buffer_bytes: usize,
    last_kind: Option<WordKind>,
    pending: Option<PendingRead>,
    max_chunk_words: usize,
    stats: StreamStats,
}

impl SliceStream {
    /// Stream over raw bytes made of `word_size` words in native byte order.
    pub fn new(data: impl Into<Bytes>, word_size: WordSize) -> Self {
        Self {
            data: data.into(),
            word_size,
            pos: 0,
            buffer: Vec::new(),
            buffer_bytes: 0,
            last_kind: None,
            pending: None,
            max_chunk_words: DEFAULT_MAX_CHUNK_WORDS,
            stats: StreamStats::default(),
        }
    }

    /// Stream whose words are `words`; the word size follows `T`.
    pub fn from_words<T: StreamScalar>(words: &[T]) -> Self {
        let bytes = Bytes::copy_from_slice(bytemuck::cast_slice(words));
        Self::new(bytes, T::SCALAR_TYPE.word_size())
    }

    /// Caps the chunk size chosen by [`WordStream::begin_chunked_read`].
    pub fn with_max_chunk_words(mut self, words: usize) -> Self {
        self.max_chunk_words = words.max(1);
        self
    }

    /// Words not yet read or skipped.
    pub fn remaining_words(&self) -> u64 {
        ((self.data.len() - self.pos) / self.word_size.bytes()) as u64
    }

    /// Index of the next word.
    pub fn position_words(&self) -> u64 {
        (self.pos / self.word_size.bytes()) as u64
    }

    /// I/O counters so far.
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    fn take_bytes(&mut self, words: u64) -> Result<std::ops::Range<usize>, MeshPartsError> {
        let available = self.remaining_words();
        if words > available {
            return Err(MeshPartsError::StreamExhausted {
                requested: words,
                available,
            });
        }
        let start = self.pos;
        self.pos += words as usize * self.word_size.bytes();
        Ok(start..self.pos)
    }

    fn fill(&mut self, kind: WordKind, words: usize) -> Result<(), MeshPartsError> {
        let range = self.take_bytes(words as u64)?;
        let len = range.len();
        let backing_words = len.div_ceil(8);
        self.buffer.clear();
        self.buffer.resize(backing_words, 0);
        bytemuck::cast_slice_mut::<u64, u8>(&mut self.buffer)[..len]
            .copy_from_slice(&self.data[range]);
        self.buffer_bytes = len;
        self.last_kind = Some(kind);
        self.stats.words_read += words as u64;
        self.stats.chunks_loaded += 1;
        self.stats.peak_buffer_words = self.stats.peak_buffer_words.max(words);
        Ok(())
    }
}

impl WordStream for SliceStream {
    fn word_size(&self) -> WordSize {
        self.word_size
    }

    fn skip_words(&mut self, count: u64) -> Result<(), MeshPartsError> {
        self.take_bytes(count)?;
        self.stats.words_skipped += count;
        Ok(())
    }

    fn begin_chunked_read(
        &mut self,
        kind: WordKind,
        total_elements: u64,
        words_per_element: usize,
    ) -> Result<usize, MeshPartsError> {
        let words_per_element = words_per_element.max(1);
        let chunk_elements = (self.max_chunk_words / words_per_element).max(1) as u64;
        let chunks = total_elements.div_ceil(chunk_elements) as usize;
        self.pending = (chunks > 0).then_some(PendingRead {
            kind,
            remaining_elements: total_elements,
            words_per_element,
            chunk_elements,
        });
        Ok(chunks)
    }

    fn next_chunk(&mut self) -> Result<usize, MeshPartsError> {
        let mut pending = self.pending.take().ok_or(MeshPartsError::NoChunkPending)?;
        let elements = pending.remaining_elements.min(pending.chunk_elements);
        self.fill(pending.kind, elements as usize * pending.words_per_element)?;
        pending.remaining_elements -= elements;
        if pending.remaining_elements > 0 {
            self.pending = Some(pending);
        }
        Ok(elements as usize)
    }

    fn buffer_chunk(&mut self, kind: WordKind, words: usize) -> Result<(), MeshPartsError> {
        self.fill(kind, words)
    }

    fn buffer_as<T: StreamScalar>(&self) -> Result<&[T], MeshPartsError> {
        if std::mem::size_of::<T>() != self.word_size.bytes() {
            return Err(MeshPartsError::UnalignedBuffer(T::SCALAR_TYPE));
        }
        if let Some(buffered) = self.last_kind.filter(|&k| k != T::SCALAR_TYPE.word_kind()) {
            return Err(MeshPartsError::BufferKindMismatch {
                buffered,
                requested: T::SCALAR_TYPE,
            });
        }
        let bytes = &bytemuck::cast_slice::<u64, u8>(&self.buffer)[..self.buffer_bytes];
        bytemuck::try_cast_slice(bytes).map_err(|_| MeshPartsError::UnalignedBuffer(T::SCALAR_TYPE))
    }

    fn clear_buffer(&mut self) {
        self.buffer = Vec::new();
        self.buffer_bytes = 0;
        self.last_kind = None;
    }
}
