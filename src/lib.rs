//! Standard-arguments binding and loop engine for the LUX array language.
//!
//! Every built-in LUX function is a small numeric kernel wrapped by glue code
//! that binds the caller's arguments. This crate re-exports the three layers
//! that glue code is built from.
//!
//! # Layers
//!
//! - [`lux_view`]: element kinds, the symbol layer seam ([`SymbolLayer`],
//!   [`SymbolTable`]), and kind-tagged data [`Pointer`]s
//! - [`lux_loop`]: per-argument [`LoopInfo`], axis selection with
//!   [`set_axes`], and odometer stepping with [`advance_loop`]
//! - [`lux_args`]: format specification parsing, [`standard_args`] binding,
//!   [`SpecCache`], and the [`BindingRegistry`]
//!
//! # Quick start
//!
//! ```
//! use lux_engine::{ops::default_registry, SymbolLayer, SymbolTable};
//!
//! let registry = default_registry().unwrap();
//! let mut table = SymbolTable::new();
//! let x = table.array(&[3, 2], vec![3.0f64, 4.0, 0.0, 1.0, 2.0, 2.0]);
//! let norms = registry.call("norm3", &mut table, &[Some(x)]).unwrap().unwrap();
//! assert_eq!(table.dims(norms), vec![2]);
//! assert_eq!(table.slice::<f64>(norms).unwrap(), &[5.0, 3.0]);
//! ```

pub use lux_args::{
    ops, parse, parse_format, standard_args, standard_args_with, ArgClause, ArgsError, Binding,
    BindingRegistry, BindingRegistryBuilder, Coercion, DimSpec, Direction, FormatSpec, KernelFn,
    SpecCache, StandardArgs, Tail, LUX_ERROR,
};
pub use lux_loop::{advance_loop, advance_together, set_axes, AxisFlag, AxisMode, LoopInfo};
pub use lux_view::{
    col_major_strides, element_count, ArrayData, Element, ElementKind, LuxError, Pointer, Scalar,
    Symbol, SymbolClass, SymbolId, SymbolLayer, SymbolTable, MAX_BYTES, MAX_DIMS,
    MAX_ELEMENTS,
};

pub use lux_args;
pub use lux_loop;
pub use lux_view;
