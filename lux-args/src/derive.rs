//! Output kind and shape derivation.

use lux_view::{ElementKind, LuxError, Result, SymbolId, SymbolLayer, MAX_DIMS};

use crate::conform::Reference;
use crate::parse::{ArgClause, Coercion, DimSpec, Tail};

/// Element kind of an output clause.
pub(crate) fn output_kind(index: usize, clause: &ArgClause, reference: Option<&Reference>) -> Result<ElementKind> {
    let ref_kind = reference.and_then(|r| r.kind);
    let missing = || LuxError::IncompatibleArgument {
        index,
        reference: clause.reference.unwrap_or(index),
    };
    match clause.coercion {
        Coercion::None => ref_kind.ok_or_else(missing),
        Coercion::Check(kind) => Ok(kind),
        Coercion::AtLeast(kind) => Ok(ref_kind.map_or(kind, |r| r.promote(kind))),
    }
}

/// Dimensions of an output clause.
///
/// Explicit tokens consume reference dimensions left to right: `N` produces
/// `N` (and skips a reference dimension if one is left), `+N` inserts `N`,
/// `-N` skips one, `=` and `:` copy one. The rest token then appends the
/// remaining reference dimensions (`&`) or their element count (`#`).
pub(crate) fn derive_dims(index: usize, clause: &ArgClause, reference: Option<&Reference>) -> Result<Vec<usize>> {
    let ref_dims: &[usize] = reference.map_or(&[], |r| &r.dims);
    let exhausted = || LuxError::IllegalNumberOfDimensions {
        index,
        ndim: ref_dims.len(),
    };

    let mut dims = Vec::with_capacity(ref_dims.len() + clause.dims.len());
    let mut next = 0;
    for token in &clause.dims {
        match *token {
            DimSpec::Exact(n) => {
                dims.push(n);
                next = (next + 1).min(ref_dims.len());
            }
            DimSpec::Insert(n) => dims.push(n),
            DimSpec::Remove(size) => {
                let &extent = ref_dims.get(next).ok_or_else(exhausted)?;
                if let Some(n) = size.filter(|&n| n != extent) {
                    let mut expected = ref_dims.to_vec();
                    expected[next] = n;
                    return Err(LuxError::IncompatibleDimensions {
                        index,
                        found: ref_dims.to_vec(),
                        expected,
                    });
                }
                next += 1;
            }
            DimSpec::Copy | DimSpec::Any => {
                let &extent = ref_dims.get(next).ok_or_else(exhausted)?;
                dims.push(extent);
                next += 1;
            }
        }
    }

    match clause.tail {
        Some(Tail::Same) => dims.extend_from_slice(&ref_dims[next..]),
        Some(Tail::Count) => dims.push(ref_dims.iter().product()),
        Some(Tail::Any) | None => {}
    }
    if dims.len() > MAX_DIMS {
        return Err(LuxError::IllegalNumberOfDimensions {
            index,
            ndim: dims.len(),
        });
    }
    Ok(dims)
}

/// Reference dimensions read from the values of a template argument.
pub(crate) fn template_dims<S: SymbolLayer + ?Sized>(
    symbols: &S,
    index: usize,
    template: usize,
    id: SymbolId,
) -> Result<Vec<usize>> {
    let values = symbols.values(id);
    if values.is_empty() || values.len() > MAX_DIMS {
        return Err(LuxError::IllegalNumberOfDimensions {
            index: template,
            ndim: values.len(),
        });
    }
    values
        .iter()
        .map(|v| match v.to_i64() {
            n if n >= 1 => usize::try_from(n).map_err(|_| LuxError::IncompatibleArgument {
                index,
                reference: template,
            }),
            _ => Err(LuxError::IncompatibleArgument {
                index,
                reference: template,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_format;
    use lux_view::SymbolTable;

    fn derive(spec: &str, ref_dims: &[usize]) -> Result<Vec<usize>> {
        let format = parse_format(spec).unwrap();
        let index = format.len() - 1;
        let reference = Reference {
            index: 0,
            dims: ref_dims.to_vec(),
            kind: Some(ElementKind::Int32),
        };
        derive_dims(index, &format.clauses()[index], Some(&reference))
    }

    #[test]
    fn test_same_copies_reference() {
        assert_eq!(derive("iD*;rD&", &[2, 3]), Ok(vec![2, 3]));
        assert_eq!(derive("iD*;rD&", &[]), Ok(vec![]));
    }

    #[test]
    fn test_remove_leading_dim() {
        assert_eq!(derive("iD*;rD-3&", &[3, 4]), Ok(vec![4]));
        assert_eq!(derive("iD*;rD-3&", &[3]), Ok(vec![]));
        assert_eq!(derive("iD*;rD-&", &[5, 2]), Ok(vec![2]));
        assert!(matches!(
            derive("iD*;rD-3&", &[4, 3]),
            Err(LuxError::IncompatibleDimensions { index: 1, .. })
        ));
        assert_eq!(
            derive("iD*;rD-&", &[]),
            Err(LuxError::IllegalNumberOfDimensions { index: 1, ndim: 0 })
        );
    }

    #[test]
    fn test_insert_and_exact() {
        assert_eq!(derive("iD*;rD+3&", &[4, 5]), Ok(vec![3, 4, 5]));
        assert_eq!(derive("iD*;rD2,2&", &[2, 2, 7]), Ok(vec![2, 2, 7]));
        assert_eq!(derive("iD*;rD3", &[]), Ok(vec![3]));
        assert_eq!(derive("iD*;rD=,+2&", &[4, 5]), Ok(vec![4, 2, 5]));
    }

    #[test]
    fn test_count() {
        assert_eq!(derive("iD*;rD#", &[2, 3]), Ok(vec![6]));
    }

    #[test]
    fn test_output_kind() {
        let format = parse_format("iW*;o&;oF&;o>F&").unwrap();
        let reference = Reference {
            index: 0,
            dims: vec![2],
            kind: Some(ElementKind::Int32),
        };
        let kinds: Vec<_> = (1..4)
            .map(|i| output_kind(i, &format.clauses()[i], Some(&reference)).unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![ElementKind::Int32, ElementKind::Float32, ElementKind::Float32]
        );
        let doubles = Reference {
            kind: Some(ElementKind::Float64),
            ..reference
        };
        assert_eq!(
            output_kind(3, &format.clauses()[3], Some(&doubles)),
            Ok(ElementKind::Float64)
        );
    }

    #[test]
    fn test_template_dims() {
        let mut table = SymbolTable::new();
        let dims = table.array(&[2], vec![4i32, 5]);
        let bad = table.array(&[2], vec![4i32, 0]);
        let scalar = table.scalar(3i32);
        assert_eq!(template_dims(&table, 1, 0, dims), Ok(vec![4, 5]));
        assert_eq!(template_dims(&table, 1, 0, scalar), Ok(vec![3]));
        assert_eq!(
            template_dims(&table, 1, 0, bad),
            Err(LuxError::IncompatibleArgument { index: 1, reference: 0 })
        );
    }
}
