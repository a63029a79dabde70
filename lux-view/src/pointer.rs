//! Kind-tagged raw cursor into an argument's element buffer.
//!
//! All element-width arithmetic for the engine lives here: advancing by an
//! element count, and reading or writing the element under the cursor for
//! whatever kind the cursor currently carries.

use num_complex::{Complex32, Complex64};

use crate::kind::{Element, ElementKind, Scalar};

/// A mutable cursor over the elements of one argument.
///
/// A `Pointer` does not own or borrow the buffer it points into. It is
/// produced by [`SymbolLayer::data_ptr`](crate::SymbolLayer::data_ptr) and
/// stays valid only while the symbol it came from is neither redefined nor
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    kind: ElementKind,
    base: *mut u8,
}

impl Pointer {
    /// A pointer of `kind` pointing at `base`.
    pub fn new(kind: ElementKind, base: *mut u8) -> Self {
        Self { kind, base }
    }

    /// A typed pointer coming from a slice or buffer of `T`.
    pub fn from_typed<T: Element>(ptr: *mut T) -> Self {
        Self {
            kind: T::KIND,
            base: ptr as *mut u8,
        }
    }

    /// A pointer to nothing, used for absent optional arguments.
    pub fn null(kind: ElementKind) -> Self {
        Self {
            kind,
            base: std::ptr::null_mut(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.base.is_null()
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn as_raw(&self) -> *mut u8 {
        self.base
    }

    /// Move by `count` elements of the current kind (may be negative).
    ///
    /// The address arithmetic wraps; only dereferencing requires the result to
    /// be in bounds.
    #[inline]
    pub fn advance(&mut self, count: isize) {
        self.base = self
            .base
            .wrapping_offset(count.wrapping_mul(self.kind.size() as isize));
    }

    /// Copy of this pointer moved by `count` elements.
    #[inline]
    pub fn offset(&self, count: isize) -> Pointer {
        let mut p = *self;
        p.advance(count);
        p
    }

    /// View the same address as another element kind, after the underlying
    /// value changed kind.
    pub fn reinterpret(&self, kind: ElementKind) -> Pointer {
        Pointer {
            kind,
            base: self.base,
        }
    }

    /// The address as a `*mut T` if `T` is the current kind.
    pub fn typed<T: Element>(&self) -> Option<*mut T> {
        (T::KIND == self.kind).then_some(self.base as *mut T)
    }

    /// Read the element under the cursor.
    ///
    /// # Safety
    /// The pointer must point at a live, aligned element of its kind.
    pub unsafe fn read(&self) -> Scalar {
        match self.kind {
            ElementKind::Int8 => Scalar::Int8(*(self.base as *const i8)),
            ElementKind::Int16 => Scalar::Int16(*(self.base as *const i16)),
            ElementKind::Int32 => Scalar::Int32(*(self.base as *const i32)),
            ElementKind::Int64 => Scalar::Int64(*(self.base as *const i64)),
            ElementKind::Float32 => Scalar::Float32(*(self.base as *const f32)),
            ElementKind::Float64 => Scalar::Float64(*(self.base as *const f64)),
            ElementKind::CFloat32 => Scalar::CFloat32(*(self.base as *const Complex32)),
            ElementKind::CFloat64 => Scalar::CFloat64(*(self.base as *const Complex64)),
        }
    }

    /// Write `value`, converted to the pointer's kind.
    ///
    /// # Safety
    /// The pointer must point at a live, aligned, writable element of its kind.
    pub unsafe fn write(&self, value: Scalar) {
        match value.convert(self.kind) {
            Scalar::Int8(v) => *(self.base as *mut i8) = v,
            Scalar::Int16(v) => *(self.base as *mut i16) = v,
            Scalar::Int32(v) => *(self.base as *mut i32) = v,
            Scalar::Int64(v) => *(self.base as *mut i64) = v,
            Scalar::Float32(v) => *(self.base as *mut f32) = v,
            Scalar::Float64(v) => *(self.base as *mut f64) = v,
            Scalar::CFloat32(v) => *(self.base as *mut Complex32) = v,
            Scalar::CFloat64(v) => *(self.base as *mut Complex64) = v,
        }
    }

    /// Read the element as a double (real part for complex kinds).
    ///
    /// # Safety
    /// Same as [`Pointer::read`].
    #[inline]
    pub unsafe fn read_f64(&self) -> f64 {
        match self.kind {
            ElementKind::Float64 => *(self.base as *const f64),
            _ => self.read().to_f64(),
        }
    }

    /// Write a double, converted to the pointer's kind.
    ///
    /// # Safety
    /// Same as [`Pointer::write`].
    #[inline]
    pub unsafe fn write_f64(&self, value: f64) {
        match self.kind {
            ElementKind::Float64 => *(self.base as *mut f64) = value,
            _ => self.write(Scalar::Float64(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_by_element_size() {
        let mut data = vec![0i16; 4];
        let mut p = Pointer::from_typed(data.as_mut_ptr());
        let start = p.as_raw() as usize;
        p.advance(3);
        assert_eq!(p.as_raw() as usize - start, 6);
        p.advance(-2);
        assert_eq!(p.as_raw() as usize - start, 2);
    }

    #[test]
    fn test_read_write_converts() {
        let mut data = vec![0.0f64; 3];
        let p = Pointer::from_typed(data.as_mut_ptr());
        unsafe {
            p.offset(1).write(Scalar::Int32(5));
            p.offset(2).write_f64(2.5);
            assert_eq!(p.offset(1).read(), Scalar::Float64(5.0));
        }
        assert_eq!(data, vec![0.0, 5.0, 2.5]);
    }

    #[test]
    fn test_typed_checks_kind() {
        let mut data = vec![1i32, 2];
        let p = Pointer::from_typed(data.as_mut_ptr());
        assert!(p.typed::<i32>().is_some());
        assert!(p.typed::<f32>().is_none());
        assert_eq!(p.reinterpret(ElementKind::Float32).kind(), ElementKind::Float32);
    }

    #[test]
    fn test_null() {
        let p = Pointer::null(ElementKind::Float64);
        assert!(p.is_null());
        assert_eq!(p.kind(), ElementKind::Float64);
    }
}
