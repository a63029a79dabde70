//! Per-argument iteration state.

use lux_view::{col_major_strides, ElementKind, Pointer, MAX_DIMS};
use smallvec::SmallVec;

pub(crate) type DimVec<T> = SmallVec<[T; MAX_DIMS]>;

/// Iteration state of one argument: its full shape and strides, the current
/// coordinate, and the restricted view of axes that [`advance_loop`] steps
/// through.
///
/// A freshly built `LoopInfo` iterates over all axes in natural order; use
/// [`set_axes`] to restrict or reorder the view.
///
/// [`advance_loop`]: crate::advance_loop
/// [`set_axes`]: crate::set_axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopInfo {
    pub(crate) kind: ElementKind,
    pub(crate) dims: DimVec<usize>,
    /// Element strides per axis; zero along broadcast axes.
    pub(crate) strides: DimVec<isize>,
    pub(crate) coords: DimVec<usize>,
    /// Restricted axes, innermost first.
    pub(crate) axes: DimVec<usize>,
    pub(crate) rdims: DimVec<usize>,
    pub(crate) rsinglestep: DimVec<isize>,
    /// Odometer digits of the restricted view.
    pub(crate) rcoords: DimVec<usize>,
    pub(crate) naxes: usize,
    pub(crate) nelem: usize,
}

impl LoopInfo {
    /// Loop state for a contiguous array of `kind` and `dims`.
    ///
    /// A scalar (empty `dims`) is treated as a one-element array.
    pub fn new(kind: ElementKind, dims: &[usize]) -> Self {
        let strides = col_major_strides(dims);
        Self::with_strides(kind, dims, &strides)
    }

    /// Loop state with explicit element strides, e.g. zero strides for
    /// axes broadcast from a smaller argument.
    ///
    /// # Panics
    /// Panics if `dims` and `strides` differ in length.
    pub fn with_strides(kind: ElementKind, dims: &[usize], strides: &[isize]) -> Self {
        assert_eq!(dims.len(), strides.len(), "dims and strides length mismatch");
        let (dims, strides): (DimVec<usize>, DimVec<isize>) = if dims.is_empty() {
            (SmallVec::from_slice(&[1]), SmallVec::from_slice(&[1]))
        } else {
            (SmallVec::from_slice(dims), SmallVec::from_slice(strides))
        };
        let ndim = dims.len();
        let mut info = Self {
            kind,
            nelem: dims.iter().product(),
            dims,
            strides,
            coords: SmallVec::from_elem(0, ndim),
            axes: SmallVec::new(),
            rdims: SmallVec::new(),
            rsinglestep: SmallVec::new(),
            rcoords: SmallVec::new(),
            naxes: ndim,
        };
        let all: DimVec<usize> = (0..ndim).collect();
        info.select(&all, ndim);
        info
    }

    /// Loop state of an absent optional argument: no axes, no elements.
    pub fn empty(kind: ElementKind) -> Self {
        Self {
            kind,
            dims: SmallVec::new(),
            strides: SmallVec::new(),
            coords: SmallVec::new(),
            axes: SmallVec::new(),
            rdims: SmallVec::new(),
            rsinglestep: SmallVec::new(),
            rcoords: SmallVec::new(),
            naxes: 0,
            nelem: 0,
        }
    }

    /// Install a restricted view. `axes` must be in range.
    pub(crate) fn select(&mut self, axes: &[usize], naxes: usize) {
        self.axes = SmallVec::from_slice(axes);
        self.rdims = axes.iter().map(|&a| self.dims[a]).collect();
        self.rsinglestep = axes.iter().map(|&a| self.strides[a]).collect();
        self.rcoords = axes.iter().map(|&a| self.coords[a]).collect();
        self.naxes = naxes;
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// Restricted axes, innermost first.
    #[inline]
    pub fn axes(&self) -> &[usize] {
        &self.axes
    }

    #[inline]
    pub fn rdims(&self) -> &[usize] {
        &self.rdims
    }

    #[inline]
    pub fn rndim(&self) -> usize {
        self.rdims.len()
    }

    /// Element stride of one step along each restricted axis.
    #[inline]
    pub fn rsinglestep(&self) -> &[isize] {
        &self.rsinglestep
    }

    /// Number of explicitly selected axes at the front of the restricted
    /// view; equals [`rndim`](Self::rndim) except after an
    /// [`AxesBlock`](crate::AxisFlag::AxesBlock) selection.
    #[inline]
    pub fn naxes(&self) -> usize {
        self.naxes
    }

    /// Total number of elements of the full shape.
    #[inline]
    pub fn nelem(&self) -> usize {
        self.nelem
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nelem == 0
    }

    /// Number of steps one full sweep of the restricted view takes.
    pub fn rnelem(&self) -> usize {
        self.rdims.iter().product()
    }

    /// Element offset of the current coordinate from the array origin.
    pub fn offset(&self) -> isize {
        self.coords
            .iter()
            .zip(self.strides.iter())
            .map(|(&c, &s)| c as isize * s)
            .sum()
    }

    /// Axes outside the restricted view, in natural order.
    pub fn complement_axes(&self) -> Vec<usize> {
        (0..self.ndim()).filter(|a| !self.axes.contains(a)).collect()
    }

    /// Rewind the restricted axes to coordinate 0, moving `ptr` along.
    pub fn reset(&mut self, ptr: &mut Pointer) {
        for i in 0..self.rdims.len() {
            ptr.advance(-(self.rcoords[i] as isize) * self.rsinglestep[i]);
            self.rcoords[i] = 0;
            self.coords[self.axes[i]] = 0;
        }
    }

    /// Element offsets visited by one sweep of the restricted view from the
    /// current coordinate, in visiting order.
    pub fn sweep_offsets(&self) -> Vec<isize> {
        let mut info = self.clone();
        let mut offset = info.offset();
        let mut out = Vec::with_capacity(info.rnelem());
        loop {
            out.push(offset);
            let (done, delta) = crate::step::step(&mut info);
            offset += delta;
            if done == info.rndim() {
                break;
            }
        }
        out
    }
}
