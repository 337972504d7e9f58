//! Error handling primitives shared across the core.

use crate::concat::Mode;
use crate::matrix::ElementType;

/// Stable status codes that cross the FFI boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// A single-plane mode received a multi-plane matrix.
    InvalidModeForPlaneCount = 1,
    /// No capacity >= 1 fits under the element ceiling.
    CapacityDegenerate = 2,
    /// Mode code outside the known set.
    UnknownMode = 3,
    /// Input failed validation.
    InvalidInput = 4,
    /// Catch-all for bugs and broken invariants.
    Internal = 5,
    /// A required pointer argument was null.
    NullPointer = 6,
}

/// Canonical error type for the core.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConcatError {
    #[error("attempting to use a {plane_count} plane matrix in mode {}", .mode.code())]
    InvalidModeForPlaneCount { mode: Mode, plane_count: usize },

    #[error("no capacity fits {element_count} elements per slice (requested {max_size})")]
    CapacityDegenerate { element_count: usize, max_size: usize },

    #[error("unknown mode {0}")]
    UnknownMode(i64),

    #[error("unknown element type {0:?}")]
    UnknownElementType(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("data length mismatch: expected {expected} elements, got {actual}")]
    DataLengthMismatch { expected: usize, actual: usize },

    #[error("element type mismatch: expected {expected}, got {actual}")]
    ElementTypeMismatch { expected: ElementType, actual: ElementType },

    #[error("plane count mismatch: expected {expected}, got {actual}")]
    PlaneCountMismatch { expected: usize, actual: usize },

    #[error("destination slot lies outside the accumulation buffer")]
    OutOfBounds,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type ConcatResult<T> = Result<T, ConcatError>;

impl ConcatError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> StatusCode {
        match self {
            ConcatError::InvalidModeForPlaneCount { .. } => StatusCode::InvalidModeForPlaneCount,
            ConcatError::CapacityDegenerate { .. } => StatusCode::CapacityDegenerate,
            ConcatError::UnknownMode(_) => StatusCode::UnknownMode,
            ConcatError::UnknownElementType(_)
            | ConcatError::InvalidShape(_)
            | ConcatError::DataLengthMismatch { .. }
            | ConcatError::ElementTypeMismatch { .. }
            | ConcatError::PlaneCountMismatch { .. }
            | ConcatError::InvalidConfig(_) => StatusCode::InvalidInput,
            ConcatError::OutOfBounds => StatusCode::Internal,
        }
    }

    /// Shape validation helper.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        ConcatError::InvalidShape(msg.into())
    }

    /// Config validation helper.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ConcatError::InvalidConfig(msg.into())
    }
}
