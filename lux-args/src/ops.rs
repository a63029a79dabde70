//! Reference bindings built on the engine.
//!
//! Each function pairs a format specification with a kernel that loops over
//! the bound pointers, in the style every numeric binding follows.

use lux_loop::AxisFlag;
use lux_view::{LuxError, Pointer};

use crate::bind::StandardArgs;
use crate::registry::{BindingRegistry, KernelFn};
use crate::Result;

/// Name, format specification, and kernel of every reference binding.
pub const BINDINGS: [(&str, &str, KernelFn); 6] = [
    ("square", "i>D*;rD&", square),
    ("add", "i>D*;i>D&;rD&", add),
    ("norm3", "i>D3*;rD-3&", norm3),
    ("total", "i>D*;rD-&", total),
    ("dblarr", "iL*;rD{0}&", dblarr),
    ("matmul2", "i>D2,2*;i>D2,2&;rD2,2&", matmul2),
];

/// A registry holding all reference bindings.
pub fn default_registry() -> Result<BindingRegistry> {
    BINDINGS
        .iter()
        .try_fold(BindingRegistry::builder(), |builder, &(name, spec, kernel)| {
            builder.register(name, spec, kernel)
        })
        .map(|builder| builder.build())
}

fn require_real(args: &StandardArgs, index: usize) -> Result<()> {
    let kind = args.pointers[index].kind();
    if kind.is_complex() {
        return Err(LuxError::IllegalType { index, kind }.into());
    }
    Ok(())
}

/// Element-wise `x * x`.
pub fn square(args: &mut StandardArgs) -> Result<()> {
    require_real(args, 0)?;
    let rndim = args.infos[0].rndim();
    loop {
        // SAFETY: both pointers walk their own bound buffers in lockstep.
        unsafe {
            let x = args.pointers[0].read_f64();
            args.pointers[1].write_f64(x * x);
        }
        if args.advance(&[0, 1]) == rndim {
            break;
        }
    }
    Ok(())
}

/// Element-wise `x + y`, with `y` broadcast over `x`.
pub fn add(args: &mut StandardArgs) -> Result<()> {
    require_real(args, 0)?;
    require_real(args, 1)?;
    let rndim = args.infos[0].rndim();
    loop {
        // SAFETY: broadcast axes of `y` have stride 0 and stay in bounds.
        unsafe {
            let sum = args.pointers[0].read_f64() + args.pointers[1].read_f64();
            args.pointers[2].write_f64(sum);
        }
        if args.advance(&[0, 1, 2]) == rndim {
            break;
        }
    }
    Ok(())
}

/// Length of each 3-vector stored along axis 0.
pub fn norm3(args: &mut StandardArgs) -> Result<()> {
    require_real(args, 0)?;
    args.set_axes(0, &[0], AxisFlag::EachRow)?;
    let step = args.infos[0].strides()[0];
    let rndim = args.infos[0].rndim();
    loop {
        let p = args.pointers[0];
        // SAFETY: axis 0 of the input has exactly 3 elements.
        let sum: f64 = (0..3)
            .map(|k| unsafe { p.offset(k * step).read_f64() })
            .map(|v| v * v)
            .sum();
        unsafe { args.pointers[1].write_f64(sum.sqrt()) };
        if args.advance(&[0, 1]) == rndim {
            break;
        }
    }
    Ok(())
}

/// Sum along axis 0.
pub fn total(args: &mut StandardArgs) -> Result<()> {
    require_real(args, 0)?;
    args.set_axes(0, &[0], AxisFlag::AxesBlock)?;
    let naxes = args.infos[0].naxes();
    let rndim = args.infos[0].rndim();
    let mut acc = 0.0;
    loop {
        acc += unsafe { args.pointers[0].read_f64() };
        let done = args.advance(&[0]);
        if done >= naxes {
            unsafe { args.pointers[1].write_f64(acc) };
            acc = 0.0;
            args.advance(&[1]);
        }
        if done == rndim {
            break;
        }
    }
    Ok(())
}

/// A zero-filled double array whose dimensions are the input's values.
pub fn dblarr(args: &mut StandardArgs) -> Result<()> {
    let rndim = args.infos[1].rndim();
    loop {
        unsafe { args.pointers[1].write_f64(0.0) };
        if args.advance(&[1]) == rndim {
            break;
        }
    }
    Ok(())
}

/// Products of 2×2 column-major matrices stacked along the remaining axes.
pub fn matmul2(args: &mut StandardArgs) -> Result<()> {
    require_real(args, 0)?;
    require_real(args, 1)?;
    for index in 0..3 {
        args.set_axes(index, &[0, 1], AxisFlag::EachBlock)?;
    }
    let rndim = args.infos[2].rndim();
    let at = |args: &StandardArgs, index: usize, r: isize, c: isize| -> Pointer {
        let strides = args.infos[index].strides();
        args.pointers[index].offset(r * strides[0] + c * strides[1])
    };
    loop {
        for r in 0..2 {
            for c in 0..2 {
                // SAFETY: every block is 2×2 and the strides come from the
                // bound shapes.
                let value: f64 = (0..2)
                    .map(|k| unsafe { at(args, 0, r, k).read_f64() * at(args, 1, k, c).read_f64() })
                    .sum();
                unsafe { at(args, 2, r, c).write_f64(value) };
            }
        }
        if args.advance(&[2, 0, 1]) == rndim {
            break;
        }
    }
    Ok(())
}
