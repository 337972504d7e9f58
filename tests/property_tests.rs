//! Property-based tests for placement, capacity fitting and engine state.

use matcat::concat::buffer::{fit_capacity, AccumulationBuffer};
use matcat::concat::ELEMENT_CEILING;
use matcat::{ConcatEngine, ElementType, Matrix, Mode, ShapeDescriptor};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────────

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Stack2D),
        Just(Mode::StackRows),
        Just(Mode::StackColumns),
    ]
}

fn arb_dims() -> impl Strategy<Value = Vec<usize>> {
    prop_oneof![
        (1usize..=16).prop_map(|w| vec![w]),
        (1usize..=16, 1usize..=8).prop_map(|(w, h)| vec![w, h]),
    ]
}

// ── Property tests ───────────────────────────────────────────────────────────

proptest! {
    /// Regions for consecutive slots touch along the growth axis and never overlap.
    #[test]
    fn consecutive_regions_are_adjacent(mode in arb_mode(), dims in arb_dims(), index in 0usize..500) {
        let shape = ShapeDescriptor::new(1, ElementType::Float32, dims).unwrap();
        let buf = AccumulationBuffer::new(mode);
        let here = buf.place(index, &shape);
        let next = buf.place(index + 1, &shape);

        let axis = if mode == Mode::StackColumns { 0 } else { 1 };
        prop_assert_eq!(here.dest_end[axis], next.dest_start[axis]);
        prop_assert!(here.dest_start[axis] < here.dest_end[axis]);
        prop_assert_eq!(here.dest_start[1 - axis], next.dest_start[1 - axis]);
        prop_assert_eq!(here.dest_end[1 - axis], next.dest_end[1 - axis]);
    }

    /// Reported dims grow by exactly one input extent per slot.
    #[test]
    fn reported_dims_grow_by_input_extent(mode in arb_mode(), dims in arb_dims(), index in 0usize..500) {
        let shape = ShapeDescriptor::new(1, ElementType::Float32, dims).unwrap();
        let buf = AccumulationBuffer::new(mode);
        let here = buf.place(index, &shape).dims;
        let next = buf.place(index + 1, &shape).dims;
        if mode == Mode::StackColumns {
            prop_assert_eq!(next[0] - here[0], shape.width());
            prop_assert_eq!(next[1], shape.height());
        } else {
            prop_assert_eq!(next[1] - here[1], shape.height());
            prop_assert_eq!(next[0], shape.width());
        }
    }

    /// The copy slot ends exactly at the reported dims and slots never overlap.
    #[test]
    fn slot_origin_sits_one_extent_behind_dims(mode in arb_mode(), dims in arb_dims(), index in 0usize..500) {
        let shape = ShapeDescriptor::new(1, ElementType::Float32, dims).unwrap();
        let buf = AccumulationBuffer::new(mode);
        let here = buf.place(index, &shape);
        let next = buf.place(index + 1, &shape);
        let extent = [shape.width(), shape.height()];
        for axis in 0..2 {
            prop_assert_eq!(here.slot_origin[axis] + extent[axis], here.dims[axis]);
        }
        let axis = if mode == Mode::StackColumns { 0 } else { 1 };
        prop_assert_eq!(here.dims[axis], next.slot_origin[axis]);
    }

    /// The chosen capacity is the largest that stays under the ceiling.
    #[test]
    fn capacity_is_largest_fitting(count in 1usize..(1 << 26), max_size in 1usize..100_000) {
        match fit_capacity(count, max_size) {
            Ok(size) => {
                prop_assert!(size <= max_size);
                prop_assert!(count * size < ELEMENT_CEILING);
                prop_assert!(size == max_size || count * (size + 1) >= ELEMENT_CEILING);
            }
            Err(_) => prop_assert!(count >= ELEMENT_CEILING),
        }
    }

    /// Setting the current mode again never disturbs accumulated state.
    #[test]
    fn same_mode_is_a_no_op(mode in arb_mode(), width in 1usize..8, n in 1usize..6) {
        let mut engine = ConcatEngine::new(mode, 8).unwrap();
        let shape = ShapeDescriptor::new(1, ElementType::Long, vec![width]).unwrap();
        for _ in 0..n {
            engine.ingest(&Matrix::zeros(shape.clone())).unwrap();
        }
        let before = (engine.write_index(), engine.handle(), engine.last_shape().cloned());
        engine.set_mode(mode);
        prop_assert_eq!(before, (engine.write_index(), engine.handle(), engine.last_shape().cloned()));
    }

    /// Any different mode code, valid or not, rewinds the engine.
    #[test]
    fn different_mode_code_resets(start in arb_mode(), code in -3i64..6, n in 1usize..4) {
        prop_assume!(code != start.code());
        let mut engine = ConcatEngine::new(start, 8).unwrap();
        let shape = ShapeDescriptor::new(1, ElementType::Float64, vec![3]).unwrap();
        for _ in 0..n {
            engine.ingest(&Matrix::zeros(shape.clone())).unwrap();
        }
        let _ = engine.set_mode_code(code);
        prop_assert_eq!(engine.write_index(), 0);
        prop_assert!(engine.last_shape().is_none());
    }

    /// The write index always stays inside the allocated slots.
    #[test]
    fn write_index_stays_below_capacity(max_size in 1usize..6, n in 1usize..20) {
        let mut engine = ConcatEngine::new(Mode::StackRows, max_size).unwrap();
        let shape = ShapeDescriptor::new(1, ElementType::Char, vec![2]).unwrap();
        for i in 0..n {
            let emission = engine.ingest(&Matrix::zeros(shape.clone())).unwrap();
            prop_assert_eq!(emission.write_index, i % max_size);
            prop_assert!(engine.write_index() < engine.capacity());
        }
    }
}
