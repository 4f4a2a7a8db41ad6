//! Tagged scalar storage shared by every attribute array.
//!
//! The word stream delivers either 4- or 8-byte words. Rather than carrying
//! two copies of every reader (narrow/wide ids, single/double precision
//! values), readers are generic over a [`StreamScalar`] and the element type
//! is picked once per read from the stream's [`WordSize`].

use crate::io::{WordKind, WordSize};
use crate::mesh_error::MeshPartsError;

/// Scalar type tag for attribute arrays.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    F32,
    F64,
    I32,
    I64,
}

impl ScalarType {
    /// Floating-point type stored in words of `size`.
    pub fn float_for(size: WordSize) -> Self {
        match size {
            WordSize::Four => ScalarType::F32,
            WordSize::Eight => ScalarType::F64,
        }
    }

    /// How a stream buffer holding this type is interpreted.
    pub fn word_kind(self) -> WordKind {
        match self {
            ScalarType::F32 | ScalarType::F64 => WordKind::Float,
            ScalarType::I32 | ScalarType::I64 => WordKind::Int,
        }
    }

    /// Width of one element.
    pub fn word_size(self) -> WordSize {
        match self {
            ScalarType::F32 | ScalarType::I32 => WordSize::Four,
            ScalarType::F64 | ScalarType::I64 => WordSize::Eight,
        }
    }
}

/// Typed flat buffer tagged with its scalar type.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarArray {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

impl ScalarArray {
    /// A zero-filled array of `len` elements of type `ty`.
    pub fn zeros(ty: ScalarType, len: usize) -> Self {
        match ty {
            ScalarType::F32 => ScalarArray::F32(vec![0.0; len]),
            ScalarType::F64 => ScalarArray::F64(vec![0.0; len]),
            ScalarType::I32 => ScalarArray::I32(vec![0; len]),
            ScalarType::I64 => ScalarArray::I64(vec![0; len]),
        }
    }

    /// Scalar type tag for this array.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarArray::F32(_) => ScalarType::F32,
            ScalarArray::F64(_) => ScalarType::F64,
            ScalarArray::I32(_) => ScalarType::I32,
            ScalarArray::I64(_) => ScalarType::I64,
        }
    }

    /// Length of the underlying flat buffer.
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::F32(v) => v.len(),
            ScalarArray::F64(v) => v.len(),
            ScalarArray::I32(v) => v.len(),
            ScalarArray::I64(v) => v.len(),
        }
    }

    /// Return true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows or shrinks the buffer, zero-filling new elements.
    pub fn resize(&mut self, len: usize) {
        match self {
            ScalarArray::F32(v) => v.resize(len, 0.0),
            ScalarArray::F64(v) => v.resize(len, 0.0),
            ScalarArray::I32(v) => v.resize(len, 0),
            ScalarArray::I64(v) => v.resize(len, 0),
        }
    }

    /// Borrow the values as `T` if the tag matches.
    pub fn as_slice<T: StreamScalar>(&self) -> Option<&[T]> {
        T::unwrap(self).map(Vec::as_slice)
    }

    /// Mutably borrow the values as `T`.
    ///
    /// # Errors
    /// [`MeshPartsError::ScalarTypeMismatch`] when the array holds another type.
    pub fn as_mut_slice<T: StreamScalar>(&mut self) -> Result<&mut [T], MeshPartsError> {
        let found = self.scalar_type();
        T::unwrap_mut(self)
            .map(Vec::as_mut_slice)
            .ok_or(MeshPartsError::ScalarTypeMismatch {
                expected: T::SCALAR_TYPE,
                found,
            })
    }
}

/// Element types a word stream can be viewed as.
pub trait StreamScalar:
    bytemuck::Pod + num_traits::NumCast + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Scalar type tag for this concrete type.
    const SCALAR_TYPE: ScalarType;

    /// Borrow a typed buffer if the tag matches.
    fn unwrap(array: &ScalarArray) -> Option<&Vec<Self>>;
    /// Mutably borrow a typed buffer if the tag matches.
    fn unwrap_mut(array: &mut ScalarArray) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_stream_scalar {
    ($ty:ty, $variant:ident) => {
        impl StreamScalar for $ty {
            const SCALAR_TYPE: ScalarType = ScalarType::$variant;

            fn unwrap(array: &ScalarArray) -> Option<&Vec<Self>> {
                match array {
                    ScalarArray::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn unwrap_mut(array: &mut ScalarArray) -> Option<&mut Vec<Self>> {
                match array {
                    ScalarArray::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_stream_scalar!(f32, F32);
impl_stream_scalar!(f64, F64);
impl_stream_scalar!(i32, I32);
impl_stream_scalar!(i64, I64);
