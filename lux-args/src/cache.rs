//! Memoized format specifications.

use std::collections::HashMap;
use std::sync::Arc;

use crate::parse::{parse_format, FormatSpec};
use crate::Result;

/// Parsed format specifications keyed by their source text.
///
/// A spec is parsed once on first use; later lookups share the same
/// [`FormatSpec`]. Malformed specs are not cached.
#[derive(Debug, Default, Clone)]
pub struct SpecCache {
    specs: HashMap<String, Arc<FormatSpec>>,
}

impl SpecCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&mut self, spec: &str) -> Result<Arc<FormatSpec>> {
        if let Some(parsed) = self.specs.get(spec) {
            return Ok(Arc::clone(parsed));
        }
        tracing::debug!(spec, "format specification cache miss");
        let parsed = Arc::new(parse_format(spec)?);
        self.specs.insert(spec.to_owned(), Arc::clone(&parsed));
        Ok(parsed)
    }

    pub fn get(&self, spec: &str) -> Option<Arc<FormatSpec>> {
        self.specs.get(spec).cloned()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_once() {
        let mut cache = SpecCache::new();
        let a = cache.get_or_parse("i>D*;rD&").unwrap();
        let b = cache.get_or_parse("i>D*;rD&").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_malformed_not_cached() {
        let mut cache = SpecCache::new();
        assert!(cache.get_or_parse("x").is_err());
        assert!(cache.is_empty());
        assert!(cache.get("x").is_none());
    }
}
