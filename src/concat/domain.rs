//! Concatenation modes, slice placement and what the engine emits per ingest.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{ConcatError, ConcatResult};
use crate::common::ids::BufferHandle;

/// Axis along which incoming matrices are stacked.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Mode {
    /// Grow along the second dimension; any plane count.
    #[default]
    Stack2D,
    /// Grow along the second dimension; single-plane input only.
    StackRows,
    /// Grow along the first dimension; single-plane input only.
    StackColumns,
}

impl Mode {
    /// Host attribute value for this mode.
    pub const fn code(self) -> i64 {
        match self {
            Mode::Stack2D => 0,
            Mode::StackRows => 1,
            Mode::StackColumns => 2,
        }
    }

    pub const fn requires_single_plane(self) -> bool {
        matches!(self, Mode::StackRows | Mode::StackColumns)
    }

    pub const fn grows_columns(self) -> bool {
        matches!(self, Mode::StackColumns)
    }
}

impl TryFrom<i64> for Mode {
    type Error = ConcatError;

    fn try_from(code: i64) -> ConcatResult<Self> {
        match code {
            0 => Ok(Mode::Stack2D),
            1 => Ok(Mode::StackRows),
            2 => Ok(Mode::StackColumns),
            other => Err(ConcatError::UnknownMode(other)),
        }
    }
}

impl From<Mode> for i64 {
    fn from(mode: Mode) -> Self {
        mode.code()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Stack2D => "stack_2d",
            Mode::StackRows => "stack_rows",
            Mode::StackColumns => "stack_columns",
        };
        f.write_str(name)
    }
}

/// Where one slice goes inside the accumulation buffer.
///
/// `dest_start`/`dest_end` are the host sub-matrix coordinates (`[x, y]`,
/// end exclusive), spaced by `max(dim - 1, 1)`. Slices with more than one
/// row (or column, when stacking columns) are not copied there: the data
/// lands at `slot_origin`, the corner of the slot that ends at `dims`, so
/// consecutive slices never overlap. For single-row and single-column
/// slices `slot_origin == dest_start`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    pub dest_start: [usize; 2],
    pub dest_end: [usize; 2],
    /// Top-left `[x, y]` the slice's data is copied to.
    pub slot_origin: [usize; 2],
    /// Overall extent covered once the slice is in.
    pub dims: [usize; 2],
}

/// Lifecycle of the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineState {
    Empty,
    Accumulating,
}

/// Result of one accepted ingest: the host's two outlets plus bookkeeping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Emission {
    /// Overall output dimensions after this slice.
    pub dims: [usize; 2],
    /// Identifier of the accumulation buffer the slice was written to.
    pub handle: BufferHandle,
    /// Slot the slice occupied.
    pub write_index: usize,
    /// True when the slot was reached by wrapping past capacity.
    pub wrapped: bool,
}
