//! Element kinds, argument values, and type-erased data pointers for LUX.
//!
//! This crate is the bottom layer of the standard-arguments engine. It knows
//! nothing about format specifications or loops; it only describes *what* a
//! value is:
//!
//! # Core Types
//!
//! - [`ElementKind`]: the closed set of numeric element kinds, with sizes and
//!   promotion ranks
//! - [`Element`]: Rust types that can be stored as LUX elements
//! - [`Scalar`]: a single kind-tagged numeric value
//! - [`Pointer`]: a kind-tagged mutable cursor into an argument's elements
//! - [`SymbolLayer`]: the symbol-table operations the engine consumes, with
//!   [`SymbolTable`] as the in-memory implementation
//!
//! # Dimension convention
//!
//! Dimensions are listed fastest-varying first (axis 0 is contiguous), so a
//! 4×3 matrix of "4 vectors of 3 elements" has dims `[3, 4]`.
//! [`col_major_strides`] computes the matching element strides.

mod kind;
mod pointer;
mod symbol;

pub use kind::{Element, ElementKind, Scalar};
pub use pointer::Pointer;
pub use symbol::{ArrayData, Symbol, SymbolClass, SymbolId, SymbolLayer, SymbolTable};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of dimensions of a LUX array.
pub const MAX_DIMS: usize = 8;

/// Maximum number of elements a single allocation may hold.
pub const MAX_ELEMENTS: usize = u32::MAX as usize;

/// Maximum size in bytes of a single allocation.
pub const MAX_BYTES: usize = u32::MAX as usize;

// ============================================================================
// Stride helpers
// ============================================================================

/// Compute element strides for dims listed fastest-varying first.
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1] as isize;
    }
    strides
}

/// Number of elements described by `dims` (1 for a scalar).
///
/// Returns `None` on overflow.
pub fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

// ============================================================================
// Error types
// ============================================================================

/// Errors raised while binding arguments or selecting loop axes.
///
/// These are the user-visible conditions; every one of them is returned
/// through `Result`, never raised as a panic. `index` fields name the
/// zero-based clause (argument) position the error concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuxError {
    /// Argument is not a numeric scalar or array.
    #[error("argument {index}: illegal class {class:?}")]
    IllegalClass { index: usize, class: SymbolClass },

    /// Argument element kind cannot be used where it was passed.
    #[error("argument {index}: illegal type {kind}")]
    IllegalType { index: usize, kind: ElementKind },

    /// Argument has the wrong number of dimensions.
    #[error("argument {index}: illegal number of dimensions {ndim}")]
    IllegalNumberOfDimensions { index: usize, ndim: usize },

    /// Argument dimensions do not match the required or linked dimensions.
    #[error("argument {index}: dimensions {found:?} incompatible with {expected:?}")]
    IncompatibleDimensions {
        index: usize,
        found: Vec<usize>,
        expected: Vec<usize>,
    },

    /// Argument does not conform to the argument it is linked to.
    #[error("argument {index}: incompatible with argument {reference}")]
    IncompatibleArgument { index: usize, reference: usize },

    /// A scalar was required.
    #[error("argument {index}: need a scalar")]
    NeedScalar { index: usize },

    /// An array was required.
    #[error("argument {index}: need an array")]
    NeedArray { index: usize },

    /// An output slot must be a named variable.
    #[error("argument {index}: need a named variable")]
    NeedNamedVariable { index: usize },

    /// Axis out of range, or duplicated where axes must be unique.
    #[error("illegal axis {axis} for {ndim} dimensions")]
    IllegalAxis { axis: usize, ndim: usize },

    /// The symbol layer could not provide a value of the requested shape.
    #[error("cannot allocate array with dimensions {dims:?}")]
    AllocationError { dims: Vec<usize> },

    /// Too few or too many arguments for the format specification.
    #[error("wrong number of arguments: {found} (expected {min}..={max})")]
    WrongNumberOfArguments { found: usize, min: usize, max: usize },
}

impl LuxError {
    /// The argument position this error concerns, if any.
    pub fn index(&self) -> Option<usize> {
        match *self {
            LuxError::IllegalClass { index, .. }
            | LuxError::IllegalType { index, .. }
            | LuxError::IllegalNumberOfDimensions { index, .. }
            | LuxError::IncompatibleDimensions { index, .. }
            | LuxError::IncompatibleArgument { index, .. }
            | LuxError::NeedScalar { index }
            | LuxError::NeedArray { index }
            | LuxError::NeedNamedVariable { index } => Some(index),
            LuxError::IllegalAxis { .. }
            | LuxError::AllocationError { .. }
            | LuxError::WrongNumberOfArguments { .. } => None,
        }
    }
}

/// Result type for value and loop operations.
pub type Result<T> = std::result::Result<T, LuxError>;
