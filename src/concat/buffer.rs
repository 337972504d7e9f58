//! The accumulation buffer: one preallocated matrix that incoming slices are
//! copied into, side by side along the active axis.

use tracing::{debug, warn};

use crate::common::error::{ConcatError, ConcatResult};
use crate::matrix::{Matrix, ShapeDescriptor};

use super::domain::{Mode, Placement};

/// Upper bound on elements in one accumulation buffer (exclusive).
pub const ELEMENT_CEILING: usize = 0x3FFF_FFFF;

/// Largest `size <= max_size` with `element_count * size < ELEMENT_CEILING`.
pub fn fit_capacity(element_count: usize, max_size: usize) -> ConcatResult<usize> {
    let degenerate = ConcatError::CapacityDegenerate {
        element_count,
        max_size,
    };
    if element_count == 0 || max_size == 0 {
        return Err(degenerate);
    }
    let size = max_size.min((ELEMENT_CEILING - 1) / element_count);
    if size == 0 {
        return Err(degenerate);
    }
    Ok(size)
}

/// Growing output plus the write cursor and the shape it was built for.
#[derive(Debug)]
pub struct AccumulationBuffer {
    mode: Mode,
    matrix: Option<Matrix>,
    capacity: usize,
    write_index: usize,
    last_shape: Option<ShapeDescriptor>,
}

impl AccumulationBuffer {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            matrix: None,
            capacity: 0,
            write_index: 0,
            last_shape: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn matrix(&self) -> Option<&Matrix> {
        self.matrix.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn last_shape(&self) -> Option<&ShapeDescriptor> {
        self.last_shape.as_ref()
    }

    pub fn is_allocated(&self) -> bool {
        self.matrix.is_some()
    }

    /// Whether `shape` can be written without reallocating.
    pub fn accepts(&self, shape: &ShapeDescriptor) -> bool {
        self.matrix.is_some()
            && self
                .last_shape
                .as_ref()
                .is_some_and(|last| last.is_compatible(shape))
    }

    /// Drop the storage and rewind. The next ingest allocates afresh.
    pub fn reset(&mut self) {
        self.matrix = None;
        self.capacity = 0;
        self.write_index = 0;
        self.last_shape = None;
    }

    /// Switch modes; any change discards the current contents.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            self.reset();
        }
        self.mode = mode;
    }

    /// Capacity a buffer for `shape` would get, or the error `allocate`
    /// would return.
    pub fn fit(&self, shape: &ShapeDescriptor, max_size: usize) -> ConcatResult<usize> {
        if self.mode.requires_single_plane() && shape.plane_count() > 1 {
            return Err(ConcatError::InvalidModeForPlaneCount {
                mode: self.mode,
                plane_count: shape.plane_count(),
            });
        }
        fit_capacity(shape.total_element_count(), max_size)
    }

    /// Size a fresh zeroed matrix for up to `max_size` slices of `shape`.
    ///
    /// Nothing is touched when the mode rejects the plane count or no
    /// capacity fits under [`ELEMENT_CEILING`].
    pub fn allocate(&mut self, shape: &ShapeDescriptor, max_size: usize) -> ConcatResult<&Matrix> {
        let size = self.fit(shape, max_size)?;
        if size < max_size {
            warn!(
                requested = max_size,
                capacity = size,
                elements = shape.total_element_count(),
                "accumulation capacity shrunk to fit element ceiling"
            );
        }

        let (x, y) = (shape.width(), shape.height());
        let dims = if self.mode.grows_columns() {
            vec![x * size, y]
        } else {
            vec![x, y * size]
        };
        let out_shape = ShapeDescriptor::new(shape.plane_count(), shape.element_type(), dims)?;
        debug!(mode = %self.mode, capacity = size, dims = ?out_shape.dims(), "allocated accumulation buffer");

        let mut matrix = Matrix::zeros(out_shape);
        matrix.set_used_dst_dim(true);
        self.capacity = size;
        self.write_index = 0;
        self.last_shape = None;
        let matrix = self.matrix.insert(matrix);
        Ok(&*matrix)
    }

    /// Coordinates for slice `index` of `shape` under the current mode.
    ///
    /// Along the growth axis slices are spaced by `max(dim - 1, 1)`, so
    /// single-row and single-column inputs never produce an empty region.
    pub fn place(&self, index: usize, shape: &ShapeDescriptor) -> Placement {
        let (x, y) = (shape.width(), shape.height());
        let x_diff = x.saturating_sub(1).max(1);
        let y_diff = y.saturating_sub(1).max(1);

        match self.mode {
            Mode::Stack2D | Mode::StackRows => Placement {
                dest_start: [0, index * y_diff],
                dest_end: [x, index * y_diff + y_diff],
                slot_origin: [0, index * y],
                dims: [x, index * y + y],
            },
            Mode::StackColumns => Placement {
                dest_start: [index * x_diff, 0],
                dest_end: [index * x_diff + x_diff, y],
                slot_origin: [index * x, 0],
                dims: [index * x + x, y],
            },
        }
    }

    /// Copy the whole of `source` to `placement.slot_origin`.
    pub fn copy_into(&mut self, placement: &Placement, source: &Matrix) -> ConcatResult<()> {
        let [origin_x, origin_y] = placement.slot_origin;
        let matrix = self.matrix.as_mut().ok_or(ConcatError::OutOfBounds)?;
        matrix.copy_block_from(source, origin_x, origin_y)
    }

    /// Advance the cursor past an accepted slice of `shape`, wrapping to
    /// slot 0 once every slot has been written. Returns whether it wrapped.
    pub fn commit(&mut self, shape: ShapeDescriptor) -> bool {
        self.write_index = (self.write_index + 1) % self.capacity.max(1);
        self.last_shape = Some(shape);
        if self.write_index == 0 {
            debug!(capacity = self.capacity, "accumulation buffer full, wrapping to slot 0");
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ElementType;

    fn shape(planes: usize, dims: &[usize]) -> ShapeDescriptor {
        ShapeDescriptor::new(planes, ElementType::Float32, dims.to_vec()).unwrap()
    }

    #[test]
    fn capacity_keeps_requested_size_when_it_fits() {
        assert_eq!(fit_capacity(4, 10).unwrap(), 10);
    }

    #[test]
    fn capacity_shrinks_to_largest_fitting_size() {
        let count = 1 << 20;
        let size = fit_capacity(count, 10_000).unwrap();
        assert!(count * size < ELEMENT_CEILING);
        assert!(count * (size + 1) >= ELEMENT_CEILING);
        assert_eq!(size, 1023);
    }

    #[test]
    fn capacity_degenerate_when_one_slice_is_too_big() {
        assert_eq!(
            fit_capacity(ELEMENT_CEILING, 5),
            Err(ConcatError::CapacityDegenerate {
                element_count: ELEMENT_CEILING,
                max_size: 5
            })
        );
        assert!(fit_capacity(4, 0).is_err());
    }

    #[test]
    fn allocate_lays_out_by_mode() {
        let mut rows = AccumulationBuffer::new(Mode::Stack2D);
        let m = rows.allocate(&shape(3, &[4, 2]), 5).unwrap();
        assert_eq!(m.shape().dims(), &[4, 10]);
        assert!(m.used_dst_dim());

        let mut cols = AccumulationBuffer::new(Mode::StackColumns);
        let m = cols.allocate(&shape(1, &[4]), 5).unwrap();
        assert_eq!(m.shape().dims(), &[20, 1]);
        assert_eq!(cols.capacity(), 5);
    }

    #[test]
    fn single_plane_modes_reject_planes_without_mutation() {
        for mode in [Mode::StackRows, Mode::StackColumns] {
            let mut buf = AccumulationBuffer::new(mode);
            buf.allocate(&shape(1, &[4, 1]), 3).unwrap();
            buf.commit(shape(1, &[4, 1]));
            let err = buf.allocate(&shape(3, &[4, 1]), 3).unwrap_err();
            assert_eq!(
                err,
                ConcatError::InvalidModeForPlaneCount {
                    mode,
                    plane_count: 3
                }
            );
            assert_eq!(buf.write_index(), 1);
            assert_eq!(buf.capacity(), 3);
        }
    }

    #[test]
    fn ceiling_sized_slice_leaves_buffer_untouched() {
        let small = shape(1, &[4]);
        let mut buf = AccumulationBuffer::new(Mode::Stack2D);
        buf.allocate(&small, 4).unwrap();
        buf.commit(small.clone());

        // 2^15 * 2^15 = 2^30 elements, one past the ceiling
        let huge = ShapeDescriptor::new(1, ElementType::Char, vec![1 << 15, 1 << 15]).unwrap();
        let expected = ConcatError::CapacityDegenerate {
            element_count: 1 << 30,
            max_size: 4,
        };
        assert_eq!(buf.fit(&huge, 4), Err(expected.clone()));
        assert_eq!(buf.allocate(&huge, 4).unwrap_err(), expected);

        assert_eq!(buf.write_index(), 1);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.last_shape(), Some(&small));
        assert_eq!(buf.matrix().unwrap().shape().dims(), &[4, 4]);
    }

    #[test]
    fn place_rows_for_single_row_input() {
        let buf = AccumulationBuffer::new(Mode::Stack2D);
        let p = buf.place(2, &shape(1, &[4, 1]));
        assert_eq!(p.dest_start, [0, 2]);
        assert_eq!(p.dest_end, [4, 3]);
        assert_eq!(p.slot_origin, p.dest_start);
        assert_eq!(p.dims, [4, 3]);
    }

    #[test]
    fn place_uses_dimension_difference_for_multi_row_input() {
        let buf = AccumulationBuffer::new(Mode::StackRows);
        let p = buf.place(2, &shape(1, &[4, 3]));
        assert_eq!(p.dest_start, [0, 4]);
        assert_eq!(p.dest_end, [4, 6]);
        assert_eq!(p.slot_origin, [0, 6]);
        assert_eq!(p.dims, [4, 9]);
    }

    #[test]
    fn place_columns() {
        let buf = AccumulationBuffer::new(Mode::StackColumns);
        let p = buf.place(1, &shape(1, &[4, 1]));
        assert_eq!(p.dest_start, [3, 0]);
        assert_eq!(p.dest_end, [6, 1]);
        assert_eq!(p.slot_origin, [4, 0]);
        assert_eq!(p.dims, [8, 1]);
    }

    #[test]
    fn copy_into_writes_at_slot_origin_not_dest_start() {
        let s = shape(1, &[2, 2]);
        let mut buf = AccumulationBuffer::new(Mode::Stack2D);
        buf.allocate(&s, 3).unwrap();
        let src = Matrix::from_vec(s.clone(), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let p = buf.place(1, &s);
        assert_eq!(p.slot_origin, [0, 2]);
        assert_eq!(p.dest_start, [0, 1]);
        buf.copy_into(&p, &src).unwrap();

        let out = buf.matrix().unwrap().as_f32().unwrap();
        assert_eq!(&out[..4], &[0.0; 4]);
        assert_eq!(&out[4..8], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&out[8..], &[0.0; 4]);
    }

    #[test]
    fn copy_into_without_storage_fails() {
        let s = shape(1, &[2]);
        let mut buf = AccumulationBuffer::new(Mode::Stack2D);
        let p = buf.place(0, &s);
        assert_eq!(
            buf.copy_into(&p, &Matrix::zeros(s)),
            Err(ConcatError::OutOfBounds)
        );
    }

    #[test]
    fn set_mode_resets_only_on_change() {
        let s = shape(1, &[4]);
        let mut buf = AccumulationBuffer::new(Mode::Stack2D);
        buf.allocate(&s, 4).unwrap();
        buf.commit(s);
        buf.set_mode(Mode::Stack2D);
        assert_eq!(buf.write_index(), 1);
        buf.set_mode(Mode::StackRows);
        assert_eq!(buf.write_index(), 0);
        assert!(buf.last_shape().is_none());
        assert!(!buf.is_allocated());
    }

    #[test]
    fn commit_wraps_only_when_full() {
        let s = shape(1, &[4]);
        let mut buf = AccumulationBuffer::new(Mode::Stack2D);
        buf.allocate(&s, 2).unwrap();
        assert!(!buf.commit(s.clone()));
        assert_eq!(buf.write_index(), 1);
        assert!(buf.commit(s));
        assert_eq!(buf.write_index(), 0);
        assert!(buf.last_shape().is_some());
    }
}
