//! Standard-argument binding for LUX kernels.
//!
//! A binding describes its arguments with a compact format specification
//! (see [`parse`] for the grammar). [`standard_args`] checks and coerces the
//! caller's arguments against it, allocates the outputs, and hands back one
//! [`Pointer`](lux_view::Pointer) and one [`LoopInfo`](lux_loop::LoopInfo)
//! per clause for the kernel to loop over.
//!
//! # Example
//!
//! ```
//! use lux_args::standard_args;
//! use lux_view::{SymbolTable, SymbolLayer};
//!
//! let mut table = SymbolTable::new();
//! let x = table.array(&[2, 3], vec![1i32, 2, 3, 4, 5, 6]);
//!
//! let mut args = standard_args(&mut table, &[Some(x)], "i>D*;rD&").unwrap();
//! let rndim = args.infos[0].rndim();
//! loop {
//!     unsafe {
//!         let v = args.pointers[0].read_f64();
//!         args.pointers[1].write_f64(v * v);
//!     }
//!     if args.advance(&[0, 1]) == rndim {
//!         break;
//!     }
//! }
//! let result = args.result.unwrap();
//! assert_eq!(table.dims(result), vec![2, 3]);
//! assert_eq!(table.slice::<f64>(result).unwrap()[5], 36.0);
//! ```

mod bind;
mod cache;
mod conform;
mod derive;
mod error;
pub mod ops;
pub mod parse;
mod registry;

pub use bind::{standard_args, standard_args_with, StandardArgs};
pub use cache::SpecCache;
pub use error::{ArgsError, Result, LUX_ERROR};
pub use parse::{parse_format, ArgClause, Coercion, DimSpec, Direction, FormatSpec, Tail};
pub use registry::{Binding, BindingRegistry, BindingRegistryBuilder, KernelFn};
