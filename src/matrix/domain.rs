//! Shape and element type descriptors for host matrices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{ConcatError, ConcatResult};

/// Numeric element types understood by the host.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 8-bit unsigned integer.
    Char = 0,
    /// 32-bit signed integer.
    Long = 1,
    /// 32-bit float.
    Float32 = 2,
    /// 64-bit float.
    Float64 = 3,
}

impl ElementType {
    pub const fn byte_size(self) -> usize {
        match self {
            ElementType::Char => 1,
            ElementType::Long | ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Char => "char",
            ElementType::Long => "long",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
        }
    }

    /// Map a stable wire code back to a type.
    pub fn from_code(code: u32) -> ConcatResult<Self> {
        match code {
            0 => Ok(ElementType::Char),
            1 => Ok(ElementType::Long),
            2 => Ok(ElementType::Float32),
            3 => Ok(ElementType::Float64),
            other => Err(ConcatError::UnknownElementType(other.to_string())),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = ConcatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" => Ok(ElementType::Char),
            "long" => Ok(ElementType::Long),
            "float32" => Ok(ElementType::Float32),
            "float64" => Ok(ElementType::Float64),
            other => Err(ConcatError::UnknownElementType(other.to_string())),
        }
    }
}

/// Plane count, element type and the one or two dimensions of a matrix.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct ShapeDescriptor {
    plane_count: usize,
    element_type: ElementType,
    dims: Vec<usize>,
    #[serde(skip)]
    element_count: usize,
    #[serde(skip)]
    byte_len: usize,
}

impl ShapeDescriptor {
    pub fn new(
        plane_count: usize,
        element_type: ElementType,
        dims: impl Into<Vec<usize>>,
    ) -> ConcatResult<Self> {
        let dims = dims.into();
        if plane_count == 0 {
            return Err(ConcatError::invalid_shape("plane count must be positive"));
        }
        if dims.is_empty() || dims.len() > 2 {
            return Err(ConcatError::invalid_shape(format!(
                "expected 1 or 2 dims, got {}",
                dims.len()
            )));
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(ConcatError::invalid_shape(format!("zero-sized dim in {dims:?}")));
        }
        let element_count = dims
            .iter()
            .try_fold(plane_count, |acc, &d| acc.checked_mul(d));
        let byte_len = element_count.and_then(|n| n.checked_mul(element_type.byte_size()));
        let (Some(element_count), Some(byte_len)) = (element_count, byte_len) else {
            return Err(ConcatError::invalid_shape(format!(
                "{plane_count} planes of {dims:?} {element_type} overflow the address space"
            )));
        };
        Ok(Self {
            plane_count,
            element_type,
            dims,
            element_count,
            byte_len,
        })
    }

    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// First dimension.
    pub fn width(&self) -> usize {
        self.dims[0]
    }

    /// Second dimension, 1 for 1-D shapes.
    pub fn height(&self) -> usize {
        self.dims.get(1).copied().unwrap_or(1)
    }

    /// Elements across all planes.
    pub fn total_element_count(&self) -> usize {
        self.element_count
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Whether a buffer built for `self` can take `other` without rebuilding.
    ///
    /// A missing second dim counts as 1, so `[w]` and `[w, 1]` are compatible.
    pub fn is_compatible(&self, other: &ShapeDescriptor) -> bool {
        self.plane_count == other.plane_count
            && self.element_type == other.element_type
            && self.width() == other.width()
            && self.height() == other.height()
    }
}
