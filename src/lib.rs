// lib.rs - bounded concatenation of typed matrices
pub mod api;
pub mod common;
pub mod concat;
pub mod matrix;

pub use common::{ConcatError, ConcatResult, StatusCode};
pub use concat::{ConcatEngine, Emission, Mode};
pub use matrix::{ElementType, Matrix, ShapeDescriptor};
