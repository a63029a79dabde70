//! Odometer stepping over the restricted view.

use lux_view::Pointer;

use crate::info::LoopInfo;

/// Advance the restricted odometer one step.
///
/// Returns the restricted axis at which the carry stopped, and the element
/// offset the data cursor must move by.
#[inline]
pub(crate) fn step(info: &mut LoopInfo) -> (usize, isize) {
    let mut delta = 0isize;
    for i in 0..info.rdims.len() {
        let axis = info.axes[i];
        let step = info.rsinglestep[i];
        info.rcoords[i] += 1;
        delta += step;
        if info.rcoords[i] < info.rdims[i] {
            info.coords[axis] = info.rcoords[i];
            return (i, delta);
        }
        info.rcoords[i] = 0;
        info.coords[axis] = 0;
        delta -= step * info.rdims[i] as isize;
    }
    (info.rdims.len(), delta)
}

/// Advance `ptr` one element along the restricted view of `info`.
///
/// Returns the number of restricted axes that rolled over, which is also the
/// index of the axis that was incremented. A return value equal to
/// `info.rndim()` means the sweep is complete; `ptr` is then back at the
/// sweep's origin. The usual kernel loop is
///
/// ```
/// # use lux_loop::{advance_loop, LoopInfo};
/// # use lux_view::{ElementKind, Pointer};
/// # let mut data = vec![0.0f64; 6];
/// # let mut ptr = Pointer::from_typed(data.as_mut_ptr());
/// let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3]);
/// let mut n = 0;
/// loop {
///     unsafe { ptr.write_f64(n as f64) };
///     n += 1;
///     if advance_loop(&mut info, &mut ptr) == info.rndim() {
///         break;
///     }
/// }
/// assert_eq!(data, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
#[inline]
pub fn advance_loop(info: &mut LoopInfo, ptr: &mut Pointer) -> usize {
    let (done, delta) = step(info);
    ptr.advance(delta);
    done
}

/// Advance several co-iterated arguments one step each.
///
/// Returns the result for the first pair, which decides termination.
pub fn advance_together(pairs: &mut [(&mut LoopInfo, &mut Pointer)]) -> usize {
    let mut lead = None;
    for (info, ptr) in pairs.iter_mut() {
        let done = advance_loop(info, ptr);
        lead.get_or_insert(done);
    }
    lead.unwrap_or(0)
}
