//! Shared utilities that glue the matrix and concat domains together.
pub mod config;
pub mod error;
pub mod ids;
pub mod log;

pub use error::{ConcatError, ConcatResult, StatusCode};
