//! Restricted-view selection.

use enumset::{EnumSet, EnumSetType};
use lux_view::{LuxError, Result};

use crate::info::{DimVec, LoopInfo};

/// One flag of an [`AxisMode`].
///
/// When several selection flags are combined, `AllAxes` wins over
/// `EachRow`, which wins over `EachBlock`, which wins over `AxesBlock`.
/// `UniqueAxes` only adds validation and combines with any of them.
#[derive(EnumSetType, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisFlag {
    /// Iterate over every axis except the row axis (`axes[0]`, default 0).
    /// The kernel walks the row itself.
    EachRow,
    /// Iterate over all axes, ignoring the listed ones.
    AllAxes,
    /// Reject duplicate axes.
    UniqueAxes,
    /// The listed axes (default axis 0) form a block the kernel walks
    /// itself; iterate over the remaining axes.
    EachBlock,
    /// Listed axes first, then the remaining axes in natural order. Only
    /// the first `naxes` restricted axes are the selected ones.
    AxesBlock,
}

pub type AxisMode = EnumSet<AxisFlag>;

/// Restrict the view of `info` to the axes chosen by `axes` and `mode`.
///
/// With no selection flag the view is exactly `axes`, in the given order;
/// an empty list selects all axes. The data cursor does not move; the
/// current coordinate is kept.
///
/// ```
/// use lux_loop::{set_axes, AxisFlag, AxisMode, LoopInfo};
/// use lux_view::ElementKind;
///
/// let mut info = LoopInfo::new(ElementKind::Float64, &[2, 3, 4]);
/// set_axes(&mut info, &[1], AxisMode::empty()).unwrap();
/// assert_eq!(info.rdims(), &[3]);
/// assert_eq!(info.rsinglestep(), &[2]);
/// set_axes(&mut info, &[0], AxisFlag::EachRow).unwrap();
/// assert_eq!(info.axes(), &[1, 2]);
/// ```
pub fn set_axes(info: &mut LoopInfo, axes: &[usize], mode: impl Into<AxisMode>) -> Result<()> {
    let mode = mode.into();
    let ndim = info.ndim();

    for (i, &axis) in axes.iter().enumerate() {
        if axis >= ndim {
            return Err(LuxError::IllegalAxis { axis, ndim });
        }
        if mode.contains(AxisFlag::UniqueAxes) && axes[..i].contains(&axis) {
            return Err(LuxError::IllegalAxis { axis, ndim });
        }
    }

    let complement = |block: &[usize]| -> DimVec<usize> {
        (0..ndim).filter(|a| !block.contains(a)).collect()
    };

    let selected: DimVec<usize>;
    let naxes;
    if mode.contains(AxisFlag::AllAxes) {
        selected = (0..ndim).collect();
        naxes = ndim;
    } else if mode.contains(AxisFlag::EachRow) {
        let row = axes.first().copied().unwrap_or(0);
        selected = complement(&[row]);
        naxes = selected.len();
    } else if mode.contains(AxisFlag::EachBlock) {
        selected = if axes.is_empty() {
            complement(&[0])
        } else {
            complement(axes)
        };
        naxes = selected.len();
    } else if axes.is_empty() {
        selected = (0..ndim).collect();
        naxes = ndim;
    } else if mode.contains(AxisFlag::AxesBlock) {
        let mut all = DimVec::from_slice(axes);
        all.extend(complement(axes));
        selected = all;
        naxes = axes.len();
    } else {
        selected = DimVec::from_slice(axes);
        naxes = axes.len();
    }

    tracing::trace!(?mode, ?axes, restricted = ?selected, naxes, "set_axes");
    info.select(&selected, naxes);
    Ok(())
}
