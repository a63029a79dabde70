//! The binding call: turn an argument list and a format specification into
//! data pointers and loop state for a kernel.

use lux_loop::{advance_loop, set_axes, AxisMode, LoopInfo};
use lux_view::{ElementKind, LuxError, Pointer, SymbolClass, SymbolId, SymbolLayer};

use crate::conform::{conform_input, Reference, Resolved};
use crate::derive::{derive_dims, output_kind, template_dims};
use crate::parse::{parse_format, ArgClause, Direction, FormatSpec};
use crate::Result;

/// Bound arguments of one call, one entry per clause in clause order.
///
/// Pointers refer into buffers owned by the symbol layer and stay valid
/// until one of the bound symbols is redefined or dropped. Absent optional
/// arguments get a null pointer and an empty [`LoopInfo`].
#[derive(Debug)]
pub struct StandardArgs {
    /// The value produced by the return clause, if the spec has one.
    pub result: Option<SymbolId>,
    pub pointers: Vec<Pointer>,
    pub infos: Vec<LoopInfo>,
    /// The symbol bound to each clause: the caller's value, a converted
    /// temporary, or a newly allocated output.
    pub symbols: Vec<Option<SymbolId>>,
}

impl StandardArgs {
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.symbols.get(index).is_some_and(Option::is_some)
    }

    /// Restrict the loop of clause `index`; see [`set_axes`].
    pub fn set_axes(&mut self, index: usize, axes: &[usize], mode: impl Into<AxisMode>) -> Result<()> {
        set_axes(&mut self.infos[index], axes, mode)?;
        Ok(())
    }

    /// Advance the clauses in `which` one step each and return the result
    /// for `which[0]`.
    pub fn advance(&mut self, which: &[usize]) -> usize {
        let mut lead = None;
        for &i in which {
            let done = advance_loop(&mut self.infos[i], &mut self.pointers[i]);
            lead.get_or_insert(done);
        }
        lead.unwrap_or(0)
    }
}

/// Bind `args` according to the format specification `spec`.
///
/// `args` holds one slot per input or output clause; `None` marks an absent
/// optional argument. A malformed `spec` is a bug in the calling binding and
/// is reported as [`ArgsError::MalformedSpec`](crate::ArgsError::MalformedSpec).
pub fn standard_args<S: SymbolLayer + ?Sized>(
    symbols: &mut S,
    args: &[Option<SymbolId>],
    spec: &str,
) -> Result<StandardArgs> {
    let format = parse_format(spec).inspect_err(|e| {
        tracing::error!(error = %e, "malformed format specification");
    })?;
    standard_args_with(symbols, args, &format)
}

/// Bind `args` according to an already parsed format specification.
pub fn standard_args_with<S: SymbolLayer + ?Sized>(
    symbols: &mut S,
    args: &[Option<SymbolId>],
    format: &FormatSpec,
) -> Result<StandardArgs> {
    let (min, max) = (format.required_slots(), format.slot_count());
    let wrong_count = || LuxError::WrongNumberOfArguments {
        found: args.len(),
        min,
        max,
    };
    if args.len() < min || args.len() > max {
        return Err(wrong_count().into());
    }

    let n = format.len();
    let mut bound: Vec<Option<SymbolId>> = vec![None; n];
    let mut resolved: Vec<Option<Resolved>> = vec![None; n];
    let mut result = None;

    // Inputs first, so outputs may refer to any of them.
    for (index, clause) in format.iter().enumerate() {
        if clause.direction != Direction::Input {
            continue;
        }
        let Some(id) = args.get(index).copied().flatten() else {
            if clause.optional {
                continue;
            }
            return Err(wrong_count().into());
        };
        let reference = reference_for(&*symbols, clause, index, &bound, &resolved)?;
        let (id, res) = conform_input(symbols, index, clause, id, reference.as_ref())?;
        bound[index] = Some(id);
        resolved[index] = Some(res);
    }

    for (index, clause) in format.iter().enumerate() {
        let slot = match clause.direction {
            Direction::Input => continue,
            Direction::Output => match args.get(index).copied().flatten() {
                Some(id) if symbols.is_named(id) => {
                    // Redefining an input's variable would swap its buffer
                    // under the input's loop.
                    let aliased = format.iter().enumerate().position(|(j, c)| {
                        c.direction == Direction::Input && args.get(j).copied().flatten() == Some(id)
                    });
                    if let Some(reference) = aliased {
                        return Err(LuxError::IncompatibleArgument { index, reference }.into());
                    }
                    Some(id)
                }
                Some(_) => return Err(LuxError::NeedNamedVariable { index }.into()),
                None if clause.optional => continue,
                None => return Err(wrong_count().into()),
            },
            Direction::Return => None,
        };
        let reference = reference_for(&*symbols, clause, index, &bound, &resolved)?;
        let kind = output_kind(index, clause, reference.as_ref())?;
        let dims = derive_dims(index, clause, reference.as_ref())?;
        let id = match slot {
            Some(id) => {
                symbols.redefine(id, kind, &dims)?;
                id
            }
            None => {
                let id = symbols.allocate(kind, &dims)?;
                symbols.mark_temporary(id);
                result = Some(id);
                id
            }
        };
        tracing::trace!(index, %kind, ?dims, "output allocated");
        bound[index] = Some(id);
        resolved[index] = Some(Resolved::contiguous(kind, dims));
    }

    // Outputs may have moved buffers, so pointers are taken last.
    let mut pointers = Vec::with_capacity(n);
    let mut infos = Vec::with_capacity(n);
    for (index, clause) in format.iter().enumerate() {
        match (bound[index], &resolved[index]) {
            (Some(id), Some(res)) => {
                pointers.push(symbols.data_ptr(id));
                infos.push(LoopInfo::with_strides(res.kind, &res.dims, &res.strides));
            }
            _ => {
                let kind = absent_kind(clause);
                pointers.push(Pointer::null(kind));
                infos.push(LoopInfo::empty(kind));
            }
        }
    }

    tracing::debug!(
        spec = %format,
        nargs = args.len(),
        result_dims = ?result.map(|id| symbols.dims(id)),
        "standard arguments bound"
    );
    Ok(StandardArgs {
        result,
        pointers,
        infos,
        symbols: bound,
    })
}

fn absent_kind(clause: &ArgClause) -> ElementKind {
    clause.coercion.kind().unwrap_or(ElementKind::Int32)
}

/// The reference a clause is measured against, if it needs one.
fn reference_for<S: SymbolLayer + ?Sized>(
    symbols: &S,
    clause: &ArgClause,
    index: usize,
    bound: &[Option<SymbolId>],
    resolved: &[Option<Resolved>],
) -> std::result::Result<Option<Reference>, LuxError> {
    let needs_dims = clause.needs_reference_dims();
    if !needs_dims && !clause.needs_reference_kind() {
        // Still pick up the kind for `>` outputs when it is at hand.
        return Ok(clause
            .reference
            .filter(|_| clause.direction != Direction::Input)
            .and_then(|k| resolved[k].as_ref().map(|r| (k, r)))
            .map(|(k, r)| Reference {
                index: k,
                dims: r.dims.clone(),
                kind: Some(r.kind),
            }));
    }

    let absent = |k: usize| LuxError::IncompatibleArgument {
        index,
        reference: k,
    };
    let uses_reference_dims = needs_dims && clause.template.is_none();
    let from_reference = match clause.reference {
        Some(k) => match resolved[k].as_ref() {
            Some(r) => Some((k, r)),
            None if uses_reference_dims || clause.needs_reference_kind() => {
                return Err(absent(k))
            }
            None => None,
        },
        None => None,
    };
    let kind = from_reference.map(|(_, r)| r.kind);

    let reference = match (clause.template, from_reference) {
        (Some(t), _) if needs_dims => {
            let id = bound[t].ok_or_else(|| absent(t))?;
            if symbols.class(id) == SymbolClass::Undefined {
                return Err(absent(t));
            }
            Reference {
                index: t,
                dims: template_dims(symbols, index, t, id)?,
                kind,
            }
        }
        (_, Some((k, r))) => Reference {
            index: k,
            dims: r.dims.clone(),
            kind,
        },
        // A kind-only output at clause 0 is rejected by the parser.
        (_, None) => return Ok(None),
    };
    Ok(Some(reference))
}
