//! Input coercion and shape checking.

use lux_view::{col_major_strides, ElementKind, LuxError, Result, SymbolClass, SymbolId, SymbolLayer};

use crate::parse::{ArgClause, Coercion, DimSpec, Tail};

/// Kind and iteration shape of one bound argument.
///
/// For a broadcast input `dims` are the reference dimensions and `strides`
/// are zero along the broadcast axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub kind: ElementKind,
    pub dims: Vec<usize>,
    pub strides: Vec<isize>,
}

impl Resolved {
    pub fn contiguous(kind: ElementKind, dims: Vec<usize>) -> Self {
        let strides = col_major_strides(&dims);
        Self {
            kind,
            dims,
            strides,
        }
    }
}

/// The shape a clause is measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    /// Clause the dimensions came from.
    pub index: usize,
    pub dims: Vec<usize>,
    pub kind: Option<ElementKind>,
}

/// Element kind an input of kind `actual` is bound with.
pub(crate) fn input_kind(index: usize, coercion: Coercion, actual: ElementKind) -> Result<ElementKind> {
    match coercion {
        Coercion::None => Ok(actual),
        Coercion::Check(kind) if actual.can_promote_to(kind) => Ok(actual),
        Coercion::Check(_) => Err(LuxError::IllegalType {
            index,
            kind: actual,
        }),
        Coercion::AtLeast(kind) => Ok(actual.promote(kind)),
    }
}

/// Check `actual` dims against `clause`, returning the iteration dims and
/// element strides the input is bound with.
pub(crate) fn match_input(
    index: usize,
    clause: &ArgClause,
    actual: &[usize],
    reference: Option<&Reference>,
) -> Result<(Vec<usize>, Vec<isize>)> {
    let actual_strides = col_major_strides(actual);
    let ref_dims: &[usize] = reference.map_or(&[], |r| &r.dims);
    let mismatch = || LuxError::IncompatibleDimensions {
        index,
        found: actual.to_vec(),
        expected: ref_dims.to_vec(),
    };

    // An empty input has no element for the kernel's first step.
    if actual.contains(&0) {
        return Err(LuxError::IncompatibleDimensions {
            index,
            found: actual.to_vec(),
            expected: actual.iter().map(|&d| d.max(1)).collect(),
        });
    }

    if clause.is_scalar() {
        if actual.iter().product::<usize>() != 1 {
            return Err(LuxError::NeedScalar { index });
        }
        return Ok((actual.to_vec(), actual_strides));
    }

    let mut dims = Vec::with_capacity(actual.len());
    let mut strides = Vec::with_capacity(actual.len());
    let mut next = 0;
    for (ri, token) in clause.dims.iter().enumerate() {
        let Some(&extent) = actual.get(next) else {
            return Err(LuxError::IllegalNumberOfDimensions {
                index,
                ndim: actual.len(),
            });
        };
        match *token {
            DimSpec::Exact(n) if extent != n => {
                let mut expected = actual.to_vec();
                expected[next] = n;
                return Err(LuxError::IncompatibleDimensions {
                    index,
                    found: actual.to_vec(),
                    expected,
                });
            }
            DimSpec::Copy if ref_dims.get(ri) != Some(&extent) => return Err(mismatch()),
            // Insert and Remove are rejected on inputs by the parser.
            DimSpec::Exact(_) | DimSpec::Copy | DimSpec::Any | DimSpec::Insert(_) | DimSpec::Remove(_) => {}
        }
        dims.push(extent);
        strides.push(actual_strides[next]);
        next += 1;
    }

    match clause.tail {
        None => {
            if next != actual.len() {
                return Err(LuxError::IllegalNumberOfDimensions {
                    index,
                    ndim: actual.len(),
                });
            }
        }
        Some(Tail::Any) => {
            dims.extend_from_slice(&actual[next..]);
            strides.extend_from_slice(&actual_strides[next..]);
        }
        Some(Tail::Count) => {
            let expected: usize = ref_dims.iter().product();
            if actual.iter().product::<usize>() != expected {
                return Err(LuxError::IncompatibleArgument {
                    index,
                    reference: reference.map_or(index, |r| r.index),
                });
            }
            dims.extend_from_slice(actual);
            strides.extend_from_slice(&actual_strides);
        }
        Some(Tail::Same) => {
            let rest = ref_dims.get(clause.dims.len()..).unwrap_or(&[]);
            for (j, &want) in rest.iter().enumerate() {
                let at = next + j;
                match actual.get(at) {
                    Some(&d) if d == want => {
                        dims.push(d);
                        strides.push(actual_strides[at]);
                    }
                    Some(1) | None => {
                        dims.push(want);
                        strides.push(0);
                    }
                    Some(_) => return Err(mismatch()),
                }
            }
            let extra = actual.get(next + rest.len()..).unwrap_or(&[]);
            if extra.iter().any(|&d| d != 1) {
                return Err(mismatch());
            }
        }
    }
    Ok((dims, strides))
}

/// Coerce and check one input argument.
///
/// Returns the symbol the kernel reads from (a converted temporary when the
/// kind changed) and its resolved iteration shape.
pub(crate) fn conform_input<S: SymbolLayer + ?Sized>(
    symbols: &mut S,
    index: usize,
    clause: &ArgClause,
    id: SymbolId,
    reference: Option<&Reference>,
) -> Result<(SymbolId, Resolved)> {
    let class = symbols.class(id);
    if class == SymbolClass::Undefined {
        return Err(LuxError::IllegalClass { index, class });
    }
    let wants_array = clause.dims.iter().any(|d| matches!(d, DimSpec::Exact(_)));
    if wants_array && class != SymbolClass::Array {
        return Err(LuxError::NeedArray { index });
    }

    let actual = symbols.kind(id);
    let kind = input_kind(index, clause.coercion, actual)?;
    let (dims, strides) = match_input(index, clause, &symbols.dims(id), reference)?;

    let bound = if kind == actual {
        id
    } else {
        let converted = symbols.convert(id, kind).map_err(|e| match e {
            LuxError::IllegalClass { class, .. } => LuxError::IllegalClass { index, class },
            e => e,
        })?;
        symbols.mark_temporary(converted);
        converted
    };
    tracing::trace!(index, %actual, %kind, ?dims, ?strides, "input resolved");
    Ok((bound, Resolved { kind, dims, strides }))
}
