//! Loop machinery for LUX argument iteration.
//!
//! Each bound argument gets a [`LoopInfo`]: its full shape and strides plus
//! a *restricted view*, the ordered list of axes the loop actually steps
//! through. [`set_axes`] chooses that view, and [`advance_loop`] moves a data
//! [`Pointer`](lux_view::Pointer) one element along it, odometer style.
//!
//! Arguments that share a shape (after broadcasting) and the same restricted
//! view advance in lockstep, so one loop drives every argument of a kernel.

mod axes;
mod info;
mod step;

pub use axes::{set_axes, AxisFlag, AxisMode};
pub use info::LoopInfo;
pub use step::{advance_loop, advance_together};
