//! End-to-end scenarios over the whole engine.

use approx::assert_relative_eq;
use lux_engine::{
    advance_loop, ops::default_registry, set_axes, standard_args, AxisFlag, AxisMode, ElementKind,
    LoopInfo, LuxError, Pointer, SymbolLayer, SymbolTable,
};

#[test]
fn test_unary_double_return() {
    let mut table = SymbolTable::new();
    let x = table.array_from_fn(&[2, 3], |i| i as f64);
    let mut args = standard_args(&mut table, &[Some(x)], "i>D*;rD&").unwrap();
    let result = args.result.unwrap();
    assert_eq!(table.dims(result), vec![2, 3]);
    assert_eq!(table.kind(result), ElementKind::Float64);

    let start = [args.pointers[0].as_raw() as usize, args.pointers[1].as_raw() as usize];
    let mut visits = 0;
    loop {
        let offsets = [
            args.pointers[0].as_raw() as usize - start[0],
            args.pointers[1].as_raw() as usize - start[1],
        ];
        assert_eq!(offsets, [visits * 8, visits * 8]);
        visits += 1;
        if args.advance(&[0, 1]) == args.infos[0].rndim() {
            break;
        }
    }
    assert_eq!(visits, 6);
}

#[test]
fn test_vector_collapse() {
    let mut table = SymbolTable::new();
    let x = table.array_from_fn(&[3, 4], |i| i as f64);
    let mut args = standard_args(&mut table, &[Some(x)], "i>D3*;rD-3&").unwrap();
    assert_eq!(table.dims(args.result.unwrap()), vec![4]);

    args.set_axes(0, &[], AxisFlag::EachRow).unwrap();
    let base = args.pointers[0].as_raw() as usize;
    let out_base = args.pointers[1].as_raw() as usize;
    let mut steps = 0;
    loop {
        assert_eq!(args.pointers[0].as_raw() as usize - base, steps * 3 * 8);
        assert_eq!(args.pointers[1].as_raw() as usize - out_base, steps * 8);
        steps += 1;
        if args.advance(&[0, 1]) == args.infos[0].rndim() {
            break;
        }
    }
    assert_eq!(steps, 4);
}

#[test]
fn test_single_axis_holds_others_fixed() {
    let mut data = vec![0.0f64; 24];
    let base = data.as_mut_ptr();
    let mut ptr = Pointer::from_typed(base);
    let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3, 4]);

    // Move to coordinate (1, 0, 2) first.
    for _ in 0..13 {
        advance_loop(&mut info, &mut ptr);
    }
    assert_eq!(info.coords(), &[1, 0, 2]);

    set_axes(&mut info, &[1], AxisMode::empty()).unwrap();
    let offset = |p: &Pointer| (p.as_raw() as usize - base as usize) / 8;
    let mut seen = vec![offset(&ptr)];
    while advance_loop(&mut info, &mut ptr) != info.rndim() {
        seen.push(offset(&ptr));
        assert_eq!(info.coords()[0], 1);
        assert_eq!(info.coords()[2], 2);
    }
    assert_eq!(seen, vec![13, 15, 17]);
}

#[test]
fn test_all_axes_visits_every_element() {
    let mut info = LoopInfo::new(ElementKind::Int16, &[3, 1, 2, 2]);
    set_axes(&mut info, &[], AxisFlag::AllAxes).unwrap();
    let offsets = info.sweep_offsets();
    assert_eq!(offsets, (0..12).collect::<Vec<isize>>());
}

#[test]
fn test_unique_axes_never_truncates() {
    let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3]);
    assert_eq!(
        set_axes(&mut info, &[0, 1, 0], AxisFlag::UniqueAxes),
        Err(LuxError::IllegalAxis { axis: 0, ndim: 2 })
    );
    assert_eq!(
        set_axes(&mut info, &[2], AxisFlag::UniqueAxes),
        Err(LuxError::IllegalAxis { axis: 2, ndim: 2 })
    );
}

#[test]
fn test_broadcast_pair_finishes_together() {
    let mut table = SymbolTable::new();
    let x = table.array_from_fn(&[4, 3, 2], |i| i as f64);
    let y = table.array_from_fn(&[4], |i| i as f64);
    let mut args = standard_args(&mut table, &[Some(x), Some(y)], "i>D*;i>D&;rD&").unwrap();
    let mut steps = [0usize; 2];
    let mut done = [false; 2];
    while !done.iter().all(|&d| d) {
        for (i, finished) in done.iter_mut().enumerate() {
            if !*finished {
                steps[i] += 1;
                let rndim = args.infos[i].rndim();
                *finished = args.advance(&[i]) == rndim;
            }
        }
    }
    assert_eq!(steps, [24, 24]);
}

#[test]
fn test_registry_round_trip() {
    let registry = default_registry().unwrap();
    let mut table = SymbolTable::new();
    let x = table.array(&[3, 2], vec![1.0f64, 2.0, 2.0, 0.0, 0.0, 7.0]);
    let norms = registry.call("norm3", &mut table, &[Some(x)]).unwrap().unwrap();
    let squared = registry.call("square", &mut table, &[Some(norms)]).unwrap().unwrap();
    let total = registry.call("total", &mut table, &[Some(squared)]).unwrap().unwrap();
    assert_relative_eq!(
        table.get_scalar(total, 0).unwrap().to_f64(),
        9.0 + 49.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_error_sentinel() {
    let registry = default_registry().unwrap();
    let mut table = SymbolTable::new();
    let err = registry.call("square", &mut table, &[]).unwrap_err();
    assert_eq!(err.sentinel(), lux_engine::LUX_ERROR);
    assert_eq!(
        err,
        LuxError::WrongNumberOfArguments { found: 0, min: 1, max: 1 }.into()
    );
}
