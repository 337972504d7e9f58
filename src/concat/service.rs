//! The concatenation engine: decides when to (re)allocate, where each slice
//! goes, and what to report back to the host.

use tracing::{debug, error, trace};

use crate::common::config::ConcatCfg;
use crate::common::error::{ConcatError, ConcatResult};
use crate::common::ids::{self, BufferHandle};
use crate::matrix::{Matrix, ShapeDescriptor};

use super::buffer::AccumulationBuffer;
use super::domain::{Emission, EngineState, Mode};

/// Stateful controller owning one accumulation buffer.
///
/// Every mutating call takes `&mut self`; a failed call leaves the engine
/// exactly as it was.
#[derive(Debug)]
pub struct ConcatEngine {
    buffer: AccumulationBuffer,
    max_size: usize,
    seed: u32,
    generation: u32,
    handle: Option<BufferHandle>,
}

impl ConcatEngine {
    pub fn new(mode: Mode, max_size: usize) -> ConcatResult<Self> {
        if max_size == 0 {
            return Err(ConcatError::CapacityDegenerate {
                element_count: 0,
                max_size,
            });
        }
        Ok(Self {
            buffer: AccumulationBuffer::new(mode),
            max_size,
            seed: ids::next_seed(),
            generation: 0,
            handle: None,
        })
    }

    pub fn from_cfg(cfg: &ConcatCfg) -> ConcatResult<Self> {
        cfg.validate()?;
        Self::new(cfg.mode()?, cfg.max_size)
    }

    pub fn mode(&self) -> Mode {
        self.buffer.mode()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn write_index(&self) -> usize {
        self.buffer.write_index()
    }

    /// Slots in the current buffer; 0 while empty.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn last_shape(&self) -> Option<&ShapeDescriptor> {
        self.buffer.last_shape()
    }

    pub fn state(&self) -> EngineState {
        if self.buffer.is_allocated() {
            EngineState::Accumulating
        } else {
            EngineState::Empty
        }
    }

    /// The accumulation matrix, if one is allocated.
    pub fn output(&self) -> Option<&Matrix> {
        self.buffer.matrix()
    }

    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle.filter(|_| self.buffer.is_allocated())
    }

    /// Check that `shape` could be ingested right now without touching any
    /// state. Fails with the error [`ingest`](Self::ingest) would return
    /// before copying any data.
    pub fn admit(&self, shape: &ShapeDescriptor) -> ConcatResult<()> {
        if self.buffer.accepts(shape) {
            return Ok(());
        }
        self.buffer.fit(shape, self.max_size).map(|_| ())
    }

    /// Append `input` to the accumulation buffer.
    ///
    /// A first input, or one whose shape differs from the previous one,
    /// rebuilds the buffer and starts again at slot 0.
    pub fn ingest(&mut self, input: &Matrix) -> ConcatResult<Emission> {
        let shape = input.shape();

        if !self.buffer.accepts(shape) {
            let allocated = self.buffer.allocate(shape, self.max_size).map(|_| ());
            if let Err(err) = allocated {
                error!(mode = %self.mode(), planes = shape.plane_count(), %err, "ingest rejected");
                return Err(err);
            }
            self.generation = self.generation.wrapping_add(1);
            let handle = BufferHandle::new(self.seed, self.generation);
            debug!(handle = %handle, capacity = self.buffer.capacity(), "new accumulation buffer");
            self.handle = Some(handle);
        }
        let handle = self.handle.ok_or(ConcatError::OutOfBounds)?;

        let index = self.buffer.write_index();
        // slot 0 of a buffer that has already taken slices means a full lap
        let wrapped = index == 0 && self.buffer.last_shape().is_some();
        let placement = self.buffer.place(index, shape);
        self.buffer.copy_into(&placement, input)?;
        self.buffer.commit(shape.clone());

        trace!(index, dims = ?placement.dims, "slice placed");
        Ok(Emission {
            dims: placement.dims,
            handle,
            write_index: index,
            wrapped,
        })
    }

    /// Change the stacking axis. Switching to a different mode clears the buffer.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode() {
            debug!(from = %self.mode(), to = %mode, "mode changed, resetting");
        }
        self.buffer.set_mode(mode);
    }

    /// Host-facing variant of [`set_mode`](Self::set_mode) taking a raw code.
    ///
    /// Any code other than the current one resets the buffer, even when the
    /// code turns out to be unknown; in that case the mode is left as it was.
    pub fn set_mode_code(&mut self, code: i64) -> ConcatResult<()> {
        if code != self.mode().code() {
            self.reset();
        }
        let mode = Mode::try_from(code)?;
        self.set_mode(mode);
        Ok(())
    }

    /// Takes effect at the next allocation.
    pub fn set_max_size(&mut self, max_size: usize) -> ConcatResult<()> {
        if max_size == 0 {
            return Err(ConcatError::CapacityDegenerate {
                element_count: 0,
                max_size,
            });
        }
        self.max_size = max_size;
        Ok(())
    }

    pub fn reset(&mut self) {
        debug!(handle = ?self.handle, "reset");
        self.buffer.reset();
        self.handle = None;
    }
}
