//! Named bindings, built once and immutable afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use lux_view::{SymbolId, SymbolLayer};

use crate::bind::{standard_args_with, StandardArgs};
use crate::cache::SpecCache;
use crate::parse::FormatSpec;
use crate::{ArgsError, Result};

/// A kernel run over bound arguments.
pub type KernelFn = fn(&mut StandardArgs) -> Result<()>;

/// One registered function: its name, parsed argument spec, and kernel.
#[derive(Debug, Clone)]
pub struct Binding {
    name: &'static str,
    spec: Arc<FormatSpec>,
    kernel: KernelFn,
}

impl Binding {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// Bind `args` and run the kernel, returning the return-clause value.
    pub fn call<S: SymbolLayer + ?Sized>(
        &self,
        symbols: &mut S,
        args: &[Option<SymbolId>],
    ) -> Result<Option<SymbolId>> {
        let mut bound = standard_args_with(symbols, args, &self.spec)?;
        (self.kernel)(&mut bound)?;
        Ok(bound.result)
    }
}

/// Collects bindings for a [`BindingRegistry`].
///
/// Specs are parsed at registration, so a malformed spec fails as soon as
/// its binding is registered.
#[derive(Debug, Default)]
pub struct BindingRegistryBuilder {
    cache: SpecCache,
    bindings: HashMap<&'static str, Binding>,
}

impl BindingRegistryBuilder {
    pub fn register(mut self, name: &'static str, spec: &str, kernel: KernelFn) -> Result<Self> {
        if self.bindings.contains_key(name) {
            return Err(ArgsError::DuplicateBinding(name));
        }
        let spec = self.cache.get_or_parse(spec)?;
        self.bindings.insert(name, Binding { name, spec, kernel });
        Ok(self)
    }

    pub fn build(self) -> BindingRegistry {
        tracing::debug!(
            bindings = self.bindings.len(),
            specs = self.cache.len(),
            "binding registry built"
        );
        BindingRegistry {
            bindings: self.bindings,
        }
    }
}

/// Immutable table of named bindings.
#[derive(Debug, Clone)]
pub struct BindingRegistry {
    bindings: HashMap<&'static str, Binding>,
}

impl BindingRegistry {
    pub fn builder() -> BindingRegistryBuilder {
        BindingRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.bindings.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Call the binding registered as `name`.
    pub fn call<S: SymbolLayer + ?Sized>(
        &self,
        name: &str,
        symbols: &mut S,
        args: &[Option<SymbolId>],
    ) -> Result<Option<SymbolId>> {
        let binding = self
            .get(name)
            .ok_or_else(|| ArgsError::UnknownBinding(name.to_string()))?;
        tracing::debug!(name, nargs = args.len(), "calling binding");
        binding.call(symbols, args)
    }
}
