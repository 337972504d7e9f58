//! Matrix domain: shape descriptors and typed element storage.

pub mod data;
pub mod domain;

pub use data::{Matrix, MatrixData};
pub use domain::{ElementType, ShapeDescriptor};
