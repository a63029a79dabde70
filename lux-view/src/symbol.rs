//! Language-level values and the symbol-table operations the engine uses.
//!
//! The interpreter owns all values; the binding engine only inspects their
//! metadata, asks for converted copies, and requests freshly shaped outputs.
//! [`SymbolLayer`] is that seam, and [`SymbolTable`] is a self-contained
//! implementation of it.

use num_complex::{Complex32, Complex64};

use crate::kind::{Element, ElementKind, Scalar};
use crate::pointer::Pointer;
use crate::{element_count, LuxError, Result, MAX_BYTES, MAX_DIMS, MAX_ELEMENTS};

/// Class of a language-level value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolClass {
    Scalar,
    Array,
    /// A scalar stored inside another symbol's buffer.
    ScalarPointer,
    Undefined,
}

/// Handle of a value owned by the symbol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

// ============================================================================
// ArrayData
// ============================================================================

/// Typed element storage, one variant per [`ElementKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    CFloat32(Vec<Complex32>),
    CFloat64(Vec<Complex64>),
}

macro_rules! each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Int8($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::Float32($v) => $body,
            ArrayData::Float64($v) => $body,
            ArrayData::CFloat32($v) => $body,
            ArrayData::CFloat64($v) => $body,
        }
    };
}

impl ArrayData {
    /// `len` zeros of `kind`.
    pub fn zeros(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::Int8 => ArrayData::Int8(vec![0; len]),
            ElementKind::Int16 => ArrayData::Int16(vec![0; len]),
            ElementKind::Int32 => ArrayData::Int32(vec![0; len]),
            ElementKind::Int64 => ArrayData::Int64(vec![0; len]),
            ElementKind::Float32 => ArrayData::Float32(vec![0.0; len]),
            ElementKind::Float64 => ArrayData::Float64(vec![0.0; len]),
            ElementKind::CFloat32 => ArrayData::CFloat32(vec![Complex32::new(0.0, 0.0); len]),
            ElementKind::CFloat64 => ArrayData::CFloat64(vec![Complex64::new(0.0, 0.0); len]),
        }
    }

    /// `len` zeros of `kind`, or `None` if the buffer cannot be reserved.
    pub fn try_zeros(kind: ElementKind, len: usize) -> Option<Self> {
        fn filled<T: Element>(len: usize) -> Option<Vec<T>> {
            let mut v = Vec::new();
            v.try_reserve_exact(len).ok()?;
            v.resize(len, T::zero());
            Some(v)
        }
        let data = match kind {
            ElementKind::Int8 => ArrayData::Int8(filled(len)?),
            ElementKind::Int16 => ArrayData::Int16(filled(len)?),
            ElementKind::Int32 => ArrayData::Int32(filled(len)?),
            ElementKind::Int64 => ArrayData::Int64(filled(len)?),
            ElementKind::Float32 => ArrayData::Float32(filled(len)?),
            ElementKind::Float64 => ArrayData::Float64(filled(len)?),
            ElementKind::CFloat32 => ArrayData::CFloat32(filled(len)?),
            ElementKind::CFloat64 => ArrayData::CFloat64(filled(len)?),
        };
        Some(data)
    }

    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        T::wrap_vec(values)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::Int8(_) => ElementKind::Int8,
            ArrayData::Int16(_) => ElementKind::Int16,
            ArrayData::Int32(_) => ElementKind::Int32,
            ArrayData::Int64(_) => ElementKind::Int64,
            ArrayData::Float32(_) => ElementKind::Float32,
            ArrayData::Float64(_) => ElementKind::Float64,
            ArrayData::CFloat32(_) => ElementKind::CFloat32,
            ArrayData::CFloat64(_) => ElementKind::CFloat64,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as a scalar.
    pub fn get(&self, index: usize) -> Scalar {
        each_variant!(self, v => v[index].into_scalar())
    }

    /// Typed slice, if `T` is the stored kind.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::unwrap_slice(self)
    }

    /// Elementwise copy converted to `kind`.
    pub fn convert(&self, kind: ElementKind) -> ArrayData {
        if kind == self.kind() {
            return self.clone();
        }
        let values = (0..self.len()).map(|i| self.get(i));
        match kind {
            ElementKind::Int8 => ArrayData::Int8(values.map(i8::from_scalar).collect()),
            ElementKind::Int16 => ArrayData::Int16(values.map(i16::from_scalar).collect()),
            ElementKind::Int32 => ArrayData::Int32(values.map(i32::from_scalar).collect()),
            ElementKind::Int64 => ArrayData::Int64(values.map(i64::from_scalar).collect()),
            ElementKind::Float32 => ArrayData::Float32(values.map(f32::from_scalar).collect()),
            ElementKind::Float64 => ArrayData::Float64(values.map(f64::from_scalar).collect()),
            ElementKind::CFloat32 => {
                ArrayData::CFloat32(values.map(Complex32::from_scalar).collect())
            }
            ElementKind::CFloat64 => {
                ArrayData::CFloat64(values.map(Complex64::from_scalar).collect())
            }
        }
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        each_variant!(self, v => v.as_mut_ptr() as *mut u8)
    }
}

// ============================================================================
// Symbol
// ============================================================================

/// One language-level value.
#[derive(Debug, Clone)]
pub struct Symbol {
    class: SymbolClass,
    kind: ElementKind,
    dims: Vec<usize>,
    data: Option<ArrayData>,
    target: Option<(SymbolId, usize)>,
    named: bool,
    temporary: bool,
}

impl Symbol {
    fn with_data(dims: Vec<usize>, data: ArrayData) -> Self {
        let class = if dims.is_empty() {
            SymbolClass::Scalar
        } else {
            SymbolClass::Array
        };
        Self {
            class,
            kind: data.kind(),
            dims,
            data: Some(data),
            target: None,
            named: false,
            temporary: false,
        }
    }

    fn undefined(named: bool) -> Self {
        Self {
            class: SymbolClass::Undefined,
            kind: ElementKind::Int32,
            dims: Vec::new(),
            data: None,
            target: None,
            named,
            temporary: false,
        }
    }

    pub fn class(&self) -> SymbolClass {
        self.class
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Dimensions, fastest-varying first; empty for scalars.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn data(&self) -> Option<&ArrayData> {
        self.data.as_ref()
    }
}

// ============================================================================
// SymbolLayer
// ============================================================================

/// Value operations the binding engine consumes from the interpreter.
///
/// Handles passed in are assumed valid for the implementation; an unknown
/// handle is a caller bug.
pub trait SymbolLayer {
    fn class(&self, id: SymbolId) -> SymbolClass;

    fn kind(&self, id: SymbolId) -> ElementKind;

    /// Dimensions, fastest-varying first; empty for scalars.
    fn dims(&self, id: SymbolId) -> Vec<usize>;

    fn element_count(&self, id: SymbolId) -> usize {
        match self.class(id) {
            SymbolClass::Undefined => 0,
            _ => element_count(&self.dims(id)).unwrap_or(0),
        }
    }

    /// Whether the value is a named variable that may receive output.
    fn is_named(&self, id: SymbolId) -> bool;

    /// A copy of `id` converted to `kind`, or `id` itself if it already has
    /// that kind. New copies are temporaries.
    fn convert(&mut self, id: SymbolId, kind: ElementKind) -> Result<SymbolId>;

    /// A new zero-filled temporary of `kind` and `dims`; a scalar when `dims`
    /// is empty.
    fn allocate(&mut self, kind: ElementKind, dims: &[usize]) -> Result<SymbolId>;

    /// Redefine a variable in place to `kind` and `dims`. Previous contents
    /// are not preserved unless kind and dims are unchanged.
    fn redefine(&mut self, id: SymbolId, kind: ElementKind, dims: &[usize]) -> Result<()>;

    fn mark_temporary(&mut self, id: SymbolId);

    /// Cursor at the first element of `id`; null for undefined values.
    fn data_ptr(&mut self, id: SymbolId) -> Pointer;

    /// All elements of `id`, in storage order.
    fn values(&self, id: SymbolId) -> Vec<Scalar>;
}

/// A zero-filled buffer for `kind` and `dims`.
///
/// Zero extents, more than [`MAX_DIMS`] dimensions, more than
/// [`MAX_ELEMENTS`] elements or [`MAX_BYTES`] bytes, and allocator refusals
/// all fail with `AllocationError`.
fn allocate_zeros(kind: ElementKind, dims: &[usize]) -> Result<ArrayData> {
    let fail = || LuxError::AllocationError {
        dims: dims.to_vec(),
    };
    if dims.len() > MAX_DIMS || dims.contains(&0) {
        return Err(fail());
    }
    let n = element_count(dims)
        .filter(|&n| n <= MAX_ELEMENTS)
        .filter(|&n| n.checked_mul(kind.size()).is_some_and(|b| b <= MAX_BYTES))
        .ok_or_else(fail)?;
    ArrayData::try_zeros(kind, n).ok_or_else(fail)
}

// ============================================================================
// SymbolTable
// ============================================================================

/// In-memory symbol layer.
///
/// Element buffers are heap allocations owned by their symbol; adding symbols
/// does not move existing buffers, so pointers handed out by
/// [`SymbolLayer::data_ptr`] stay valid until that symbol is redefined.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.push(symbol);
        SymbolId(self.symbols.len() - 1)
    }

    /// A scalar literal.
    pub fn scalar(&mut self, value: impl Into<Scalar>) -> SymbolId {
        let value = value.into();
        let mut data = ArrayData::zeros(value.kind(), 1);
        each_variant!(&mut data, v => v[0] = Element::from_scalar(value));
        self.push(Symbol::with_data(Vec::new(), data))
    }

    /// An array literal with `dims` (fastest-varying first).
    ///
    /// # Panics
    /// Panics if `dims` is empty or has a zero extent, or if `values` does
    /// not hold exactly the number of elements in `dims`.
    pub fn array<T: Element>(&mut self, dims: &[usize], values: Vec<T>) -> SymbolId {
        assert!(!dims.is_empty(), "an array needs at least one dimension");
        assert!(!dims.contains(&0), "array dims {dims:?} have a zero extent");
        assert_eq!(
            element_count(dims),
            Some(values.len()),
            "array values must fill dims {dims:?}"
        );
        self.push(Symbol::with_data(dims.to_vec(), ArrayData::from_vec(values)))
    }

    /// An array whose element `i` is `f(i)`.
    pub fn array_from_fn<T: Element>(
        &mut self,
        dims: &[usize],
        f: impl FnMut(usize) -> T,
    ) -> SymbolId {
        let n = element_count(dims).unwrap_or(0);
        self.array(dims, (0..n).map(f).collect())
    }

    /// A named variable that holds no value yet.
    pub fn named_variable(&mut self) -> SymbolId {
        self.push(Symbol::undefined(true))
    }

    /// An anonymous undefined value.
    pub fn undefined(&mut self) -> SymbolId {
        self.push(Symbol::undefined(false))
    }

    /// Mark `id` as a named variable.
    pub fn name(&mut self, id: SymbolId) {
        self.symbols[id.0].named = true;
        self.symbols[id.0].temporary = false;
    }

    /// A scalar that aliases element `index` of `target`.
    ///
    /// # Panics
    /// Panics if `target` holds no data or `index` is out of range.
    pub fn scalar_pointer(&mut self, target: SymbolId, index: usize) -> SymbolId {
        let t = &self.symbols[target.0];
        let len = t.data.as_ref().map_or(0, ArrayData::len);
        assert!(index < len, "scalar pointer index {index} out of range");
        let kind = t.kind;
        self.push(Symbol {
            class: SymbolClass::ScalarPointer,
            kind,
            dims: Vec::new(),
            data: None,
            target: Some((target, index)),
            named: false,
            temporary: false,
        })
    }

    /// Typed elements of `id`, if it stores `T`.
    pub fn slice<T: Element>(&self, id: SymbolId) -> Option<&[T]> {
        self.symbols[id.0].data.as_ref()?.as_slice::<T>()
    }

    /// Element `index` of `id`.
    pub fn get_scalar(&self, id: SymbolId, index: usize) -> Option<Scalar> {
        let symbol = &self.symbols[id.0];
        match (symbol.target, &symbol.data) {
            (Some((target, offset)), _) => self.get_scalar(target, offset + index),
            (None, Some(data)) if index < data.len() => Some(data.get(index)),
            _ => None,
        }
    }

    pub fn is_temporary(&self, id: SymbolId) -> bool {
        self.symbols[id.0].temporary
    }
}

impl SymbolLayer for SymbolTable {
    fn class(&self, id: SymbolId) -> SymbolClass {
        self.symbols[id.0].class
    }

    fn kind(&self, id: SymbolId) -> ElementKind {
        self.symbols[id.0].kind
    }

    fn dims(&self, id: SymbolId) -> Vec<usize> {
        self.symbols[id.0].dims.clone()
    }

    fn is_named(&self, id: SymbolId) -> bool {
        self.symbols[id.0].named
    }

    fn convert(&mut self, id: SymbolId, kind: ElementKind) -> Result<SymbolId> {
        if self.kind(id) == kind {
            return Ok(id);
        }
        let symbol = &self.symbols[id.0];
        let data = match (&symbol.data, symbol.target) {
            (Some(data), _) => data.convert(kind),
            (None, Some((target, index))) => {
                let value = self
                    .get_scalar(target, index)
                    .ok_or(LuxError::AllocationError { dims: vec![] })?;
                let mut data = ArrayData::zeros(value.kind(), 1);
                each_variant!(&mut data, v => v[0] = Element::from_scalar(value));
                data.convert(kind)
            }
            (None, None) => {
                return Err(LuxError::IllegalClass {
                    index: 0,
                    class: symbol.class,
                })
            }
        };
        let mut converted = Symbol::with_data(symbol.dims.clone(), data);
        converted.temporary = true;
        Ok(self.push(converted))
    }

    fn allocate(&mut self, kind: ElementKind, dims: &[usize]) -> Result<SymbolId> {
        let data = allocate_zeros(kind, dims)?;
        let mut symbol = Symbol::with_data(dims.to_vec(), data);
        symbol.temporary = true;
        Ok(self.push(symbol))
    }

    fn redefine(&mut self, id: SymbolId, kind: ElementKind, dims: &[usize]) -> Result<()> {
        let symbol = &mut self.symbols[id.0];
        let unchanged = symbol.data.is_some() && symbol.kind == kind && symbol.dims == dims;
        if !unchanged {
            let data = allocate_zeros(kind, dims)?;
            let named = symbol.named;
            *symbol = Symbol::with_data(dims.to_vec(), data);
            symbol.named = named;
        }
        Ok(())
    }

    fn mark_temporary(&mut self, id: SymbolId) {
        self.symbols[id.0].temporary = true;
    }

    fn data_ptr(&mut self, id: SymbolId) -> Pointer {
        let kind = self.symbols[id.0].kind;
        if let Some((target, index)) = self.symbols[id.0].target {
            return self.data_ptr(target).offset(index as isize);
        }
        match self.symbols[id.0].data.as_mut() {
            Some(data) => Pointer::new(kind, data.as_mut_ptr()),
            None => Pointer::null(kind),
        }
    }

    fn values(&self, id: SymbolId) -> Vec<Scalar> {
        let count = match self.class(id) {
            SymbolClass::Undefined => 0,
            SymbolClass::Scalar | SymbolClass::ScalarPointer => 1,
            SymbolClass::Array => self.element_count(id),
        };
        (0..count).filter_map(|i| self.get_scalar(id, i)).collect()
    }
}
