//! Owned, typed matrix storage.
//!
//! Elements are plane-interleaved and row-major: `(x, y, plane)` lives at
//! `(y * width + x) * plane_count + plane`.

use bytemuck::Pod;

use crate::common::error::{ConcatError, ConcatResult};

use super::domain::{ElementType, ShapeDescriptor};

/// Typed element storage, one variant per [`ElementType`].
#[derive(Clone, Debug, PartialEq)]
pub enum MatrixData {
    Char(Vec<u8>),
    Long(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl MatrixData {
    fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Char => MatrixData::Char(vec![0; len]),
            ElementType::Long => MatrixData::Long(vec![0; len]),
            ElementType::Float32 => MatrixData::Float32(vec![0.0; len]),
            ElementType::Float64 => MatrixData::Float64(vec![0.0; len]),
        }
    }

    /// Reinterpret native-endian bytes; `bytes` may be unaligned.
    fn from_bytes(element_type: ElementType, bytes: &[u8]) -> Self {
        match element_type {
            ElementType::Char => MatrixData::Char(bytes.to_vec()),
            ElementType::Long => MatrixData::Long(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float32 => MatrixData::Float32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float64 => MatrixData::Float64(bytemuck::pod_collect_to_vec(bytes)),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            MatrixData::Char(_) => ElementType::Char,
            MatrixData::Long(_) => ElementType::Long,
            MatrixData::Float32(_) => ElementType::Float32,
            MatrixData::Float64(_) => ElementType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MatrixData::Char(v) => v.len(),
            MatrixData::Long(v) => v.len(),
            MatrixData::Float32(v) => v.len(),
            MatrixData::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MatrixData::Char(v) => v,
            MatrixData::Long(v) => bytemuck::cast_slice(v),
            MatrixData::Float32(v) => bytemuck::cast_slice(v),
            MatrixData::Float64(v) => bytemuck::cast_slice(v),
        }
    }
}

impl From<Vec<u8>> for MatrixData {
    fn from(v: Vec<u8>) -> Self {
        MatrixData::Char(v)
    }
}

impl From<Vec<i32>> for MatrixData {
    fn from(v: Vec<i32>) -> Self {
        MatrixData::Long(v)
    }
}

impl From<Vec<f32>> for MatrixData {
    fn from(v: Vec<f32>) -> Self {
        MatrixData::Float32(v)
    }
}

impl From<Vec<f64>> for MatrixData {
    fn from(v: Vec<f64>) -> Self {
        MatrixData::Float64(v)
    }
}

/// A typed matrix: shape plus element storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    shape: ShapeDescriptor,
    data: MatrixData,
    used_dst_dim: bool,
}

impl Matrix {
    /// Zero-initialised matrix of the given shape.
    pub fn zeros(shape: ShapeDescriptor) -> Self {
        let data = MatrixData::zeros(shape.element_type(), shape.total_element_count());
        Self {
            shape,
            data,
            used_dst_dim: false,
        }
    }

    /// Wrap typed data; length and element type must agree with `shape`.
    pub fn from_vec(shape: ShapeDescriptor, data: impl Into<MatrixData>) -> ConcatResult<Self> {
        let data = data.into();
        if data.element_type() != shape.element_type() {
            return Err(ConcatError::ElementTypeMismatch {
                expected: shape.element_type(),
                actual: data.element_type(),
            });
        }
        if data.len() != shape.total_element_count() {
            return Err(ConcatError::DataLengthMismatch {
                expected: shape.total_element_count(),
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            data,
            used_dst_dim: false,
        })
    }

    /// Build from raw native-endian bytes, e.g. a buffer handed over FFI.
    pub fn from_bytes(shape: ShapeDescriptor, bytes: &[u8]) -> ConcatResult<Self> {
        let elem = shape.element_type().byte_size();
        if bytes.len() != shape.byte_len() {
            return Err(ConcatError::DataLengthMismatch {
                expected: shape.total_element_count(),
                actual: bytes.len() / elem,
            });
        }
        let data = MatrixData::from_bytes(shape.element_type(), bytes);
        Ok(Self {
            shape,
            data,
            used_dst_dim: false,
        })
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    pub fn data(&self) -> &MatrixData {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            MatrixData::Char(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match &self.data {
            MatrixData::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            MatrixData::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            MatrixData::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Element at column `x`, row `y`, plane `plane`, widened to `f64`.
    pub fn get(&self, x: usize, y: usize, plane: usize) -> Option<f64> {
        let planes = self.shape.plane_count();
        if x >= self.shape.width() || y >= self.shape.height() || plane >= planes {
            return None;
        }
        let idx = (y * self.shape.width() + x) * planes + plane;
        Some(match &self.data {
            MatrixData::Char(v) => v[idx] as f64,
            MatrixData::Long(v) => v[idx] as f64,
            MatrixData::Float32(v) => v[idx] as f64,
            MatrixData::Float64(v) => v[idx],
        })
    }

    /// Whether this matrix is written through destination sub-regions.
    pub fn used_dst_dim(&self) -> bool {
        self.used_dst_dim
    }

    pub fn set_used_dst_dim(&mut self, used: bool) {
        self.used_dst_dim = used;
    }

    /// Copy all of `src` so that its top-left element lands on `(x, y)`.
    ///
    /// No conversion: element type and plane count must match, and the whole
    /// source must fit.
    pub fn copy_block_from(&mut self, src: &Matrix, x: usize, y: usize) -> ConcatResult<()> {
        if src.shape.element_type() != self.shape.element_type() {
            return Err(ConcatError::ElementTypeMismatch {
                expected: self.shape.element_type(),
                actual: src.shape.element_type(),
            });
        }
        if src.shape.plane_count() != self.shape.plane_count() {
            return Err(ConcatError::PlaneCountMismatch {
                expected: self.shape.plane_count(),
                actual: src.shape.plane_count(),
            });
        }
        if x + src.shape.width() > self.shape.width() || y + src.shape.height() > self.shape.height() {
            return Err(ConcatError::OutOfBounds);
        }

        let (expected, actual) = (self.data.element_type(), src.data.element_type());
        let layout = BlockLayout {
            planes: self.shape.plane_count(),
            dst_width: self.shape.width(),
            src_width: src.shape.width(),
            src_height: src.shape.height(),
            x,
            y,
        };
        match (&mut self.data, &src.data) {
            (MatrixData::Char(d), MatrixData::Char(s)) => layout.copy(d, s),
            (MatrixData::Long(d), MatrixData::Long(s)) => layout.copy(d, s),
            (MatrixData::Float32(d), MatrixData::Float32(s)) => layout.copy(d, s),
            (MatrixData::Float64(d), MatrixData::Float64(s)) => layout.copy(d, s),
            _ => return Err(ConcatError::ElementTypeMismatch { expected, actual }),
        }
        Ok(())
    }
}

struct BlockLayout {
    planes: usize,
    dst_width: usize,
    src_width: usize,
    src_height: usize,
    x: usize,
    y: usize,
}

impl BlockLayout {
    fn copy<T: Pod>(&self, dst: &mut [T], src: &[T]) {
        let row = self.src_width * self.planes;
        if self.x == 0 && self.src_width == self.dst_width {
            // full-width rows are contiguous in the destination
            let start = self.y * self.dst_width * self.planes;
            dst[start..start + src.len()].copy_from_slice(src);
            return;
        }
        for r in 0..self.src_height {
            let d = ((self.y + r) * self.dst_width + self.x) * self.planes;
            let s = r * row;
            dst[d..d + row].copy_from_slice(&src[s..s + row]);
        }
    }
}
