use std::collections::BTreeSet;

use lux_loop::{advance_loop, set_axes, AxisFlag, AxisMode, LoopInfo};
use lux_view::{col_major_strides, ElementKind, LuxError, Pointer, MAX_DIMS};
use proptest::prelude::*;

/// Every rank up to `MAX_DIMS`, with extents small enough to sweep.
fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=3, 1..=MAX_DIMS)
}

/// Dims plus a permutation of a random subset of their axes.
fn dims_and_axes() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    dims_strategy().prop_flat_map(|dims| {
        let ndim = dims.len();
        let axes = Just((0..ndim).collect::<Vec<_>>())
            .prop_shuffle()
            .prop_flat_map(move |all| (1..=ndim).prop_map(move |n| all[..n].to_vec()));
        (Just(dims), axes)
    })
}

/// Run a full sweep and return the element offsets of every body visit.
fn sweep(info: &mut LoopInfo, buf: &mut [f64]) -> Vec<usize> {
    let base = buf.as_mut_ptr();
    let mut ptr = Pointer::from_typed(base);
    let mut visits = Vec::new();
    loop {
        visits.push((ptr.as_raw() as usize - base as usize) / std::mem::size_of::<f64>());
        if advance_loop(info, &mut ptr) == info.rndim() {
            break;
        }
    }
    assert_eq!(ptr.as_raw(), base as *mut u8, "pointer not rewound");
    visits
}

proptest! {
    #[test]
    fn prop_max_rank_sweep(extents in prop::collection::vec(1usize..=2, MAX_DIMS)) {
        let n: usize = extents.iter().product();
        let mut buf = vec![0.0; n];
        let mut info = LoopInfo::new(ElementKind::Float64, &extents);
        prop_assert_eq!(info.ndim(), MAX_DIMS);
        prop_assert_eq!(sweep(&mut info, &mut buf), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_all_axes_visit_each_element_once(dims in dims_strategy()) {
        let n: usize = dims.iter().product();
        let mut buf = vec![0.0; n];
        let mut info = LoopInfo::new(ElementKind::Float64, &dims);
        let visits = sweep(&mut info, &mut buf);
        prop_assert_eq!(visits, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_restricted_sweep_visits_fiber((dims, axes) in dims_and_axes()) {
        let n: usize = dims.iter().product();
        let mut buf = vec![0.0; n];
        let mut info = LoopInfo::new(ElementKind::Float64, &dims);
        set_axes(&mut info, &axes, AxisMode::empty()).unwrap();

        let visits = sweep(&mut info, &mut buf);
        let expected: usize = axes.iter().map(|&a| dims[a]).product();
        prop_assert_eq!(visits.len(), expected);
        let unique: BTreeSet<_> = visits.iter().copied().collect();
        prop_assert_eq!(unique.len(), expected);
        prop_assert!(info.coords().iter().all(|&c| c == 0));
    }

    #[test]
    fn prop_each_row_times_row_covers_array(dims in dims_strategy()) {
        let n: usize = dims.iter().product();
        let mut buf = vec![0.0; n];
        let mut info = LoopInfo::new(ElementKind::Float64, &dims);
        set_axes(&mut info, &[], AxisFlag::EachRow).unwrap();
        let starts = sweep(&mut info, &mut buf);
        prop_assert_eq!(starts.len() * dims[0], n);
        prop_assert!(starts.iter().all(|s| s % dims[0] == 0));
    }

    #[test]
    fn prop_unique_axes_rejects_duplicates(dims in dims_strategy(), pick in 0usize..MAX_DIMS) {
        let axis = pick % dims.len();
        let mut info = LoopInfo::new(ElementKind::Float64, &dims);
        let err = set_axes(&mut info, &[axis, axis], AxisFlag::UniqueAxes).unwrap_err();
        prop_assert_eq!(err, LuxError::IllegalAxis { axis, ndim: dims.len() });
    }

    #[test]
    fn prop_broadcast_coiteration(dims in dims_strategy(), mask in prop::collection::vec(any::<bool>(), MAX_DIMS)) {
        // Collapse some axes of the source to 1 and broadcast them back.
        let small: Vec<usize> = dims
            .iter()
            .zip(mask.iter())
            .map(|(&d, &keep)| if keep { d } else { 1 })
            .collect();
        let strides: Vec<isize> = col_major_strides(&small)
            .into_iter()
            .zip(small.iter())
            .map(|(s, &d)| if d == 1 { 0 } else { s })
            .collect();

        let n: usize = dims.iter().product();
        let m: usize = small.iter().product();
        let mut out = vec![0.0f64; n];
        let mut src: Vec<f64> = (0..m).map(|v| v as f64).collect();

        let mut out_info = LoopInfo::new(ElementKind::Float64, &dims);
        let mut src_info = LoopInfo::with_strides(ElementKind::Float64, &dims, &strides);
        let mut po = Pointer::from_typed(out.as_mut_ptr());
        let mut ps = Pointer::from_typed(src.as_mut_ptr());
        loop {
            unsafe { po.write_f64(ps.read_f64()) };
            advance_loop(&mut src_info, &mut ps);
            if advance_loop(&mut out_info, &mut po) == out_info.rndim() {
                break;
            }
        }

        let small_strides = col_major_strides(&small);
        for (linear, &value) in out.iter().enumerate() {
            let mut rest = linear;
            let mut expected = 0usize;
            for (axis, &d) in dims.iter().enumerate() {
                let c = rest % d;
                rest /= d;
                if small[axis] != 1 {
                    expected += c * small_strides[axis] as usize;
                }
            }
            prop_assert_eq!(value, expected as f64);
        }
    }
}

#[test]
fn test_middle_axis_sweep() {
    let mut buf = vec![0.0; 24];
    let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3, 4]);
    set_axes(&mut info, &[1], AxisMode::empty()).unwrap();
    assert_eq!(info.rdims(), &[3]);
    assert_eq!(info.rsinglestep(), &[2]);
    assert_eq!(sweep(&mut info, &mut buf), vec![0, 2, 4]);
}

#[test]
fn test_each_block_leaves_block_to_kernel() {
    let mut buf = vec![0.0; 24];
    let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3, 4]);
    set_axes(&mut info, &[0, 1], AxisFlag::EachBlock).unwrap();
    assert_eq!(sweep(&mut info, &mut buf), vec![0, 6, 12, 18]);
}

#[test]
fn test_reset_after_partial_sweep() {
    let mut buf = vec![0.0f64; 12];
    let base = buf.as_mut_ptr();
    let mut ptr = Pointer::from_typed(base);
    let mut info = LoopInfo::new(ElementKind::Float64, &[3, 4]);
    for _ in 0..7 {
        advance_loop(&mut info, &mut ptr);
    }
    assert_eq!(info.coords(), &[1, 2]);
    info.reset(&mut ptr);
    assert_eq!(info.coords(), &[0, 0]);
    assert_eq!(ptr.as_raw(), base as *mut u8);
}
