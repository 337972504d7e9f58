//! Concat domain: incremental stacking of same-shaped matrices into a
//! bounded accumulation buffer.

pub mod buffer;
pub mod domain;
pub mod service;

pub use buffer::{AccumulationBuffer, ELEMENT_CEILING};
pub use domain::{Emission, EngineState, Mode, Placement};
pub use service::ConcatEngine;
