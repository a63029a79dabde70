//! Format specification parser.
//!
//! A format specification describes the arguments of one binding, one
//! `;`-separated clause per argument:
//!
//! ```text
//! clause = dir ['>'] [letter] ['[' k ']'] ['{' k '}'] [dims] ['?']
//! dir    = 'i' | 'o' | 'r'
//! letter = 'B' | 'W' | 'L' | 'Q' | 'F' | 'D' | 'C' | 'Z'
//! dims   = dim {[','] dim} [rest] | rest
//! dim    = N | '+' N | '-' [N] | '=' | ':'
//! rest   = '&' | '#' | '*'
//! ```
//!
//! For example `"i>D3*;rD-3&"` takes one input converted to at least double
//! precision whose first dimension is 3, and returns a double array shaped
//! like the input without that first dimension.

use std::fmt;
use std::str::FromStr;

use lux_view::{ElementKind, MAX_DIMS};

use crate::{ArgsError, Result};

/// Data flow of one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Caller-supplied value, read by the kernel.
    Input,
    /// Caller-supplied named variable, redefined and written by the kernel.
    Output,
    /// Value returned by the binding; it occupies no argument slot.
    Return,
}

impl Direction {
    pub const fn code(self) -> char {
        match self {
            Direction::Input => 'i',
            Direction::Output => 'o',
            Direction::Return => 'r',
        }
    }

    pub const fn is_input(self) -> bool {
        matches!(self, Direction::Input)
    }
}

/// Element kind requirement of one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coercion {
    /// No letter. Inputs are taken as they are; outputs get the kind of
    /// their reference.
    None,
    /// Bare letter. Inputs must promote to the kind without conversion;
    /// outputs get exactly the kind.
    Check(ElementKind),
    /// `>` plus letter. Inputs are converted to at least the kind; outputs
    /// get the reference kind promoted to at least the kind.
    AtLeast(ElementKind),
}

impl Coercion {
    pub fn kind(self) -> Option<ElementKind> {
        match self {
            Coercion::None => None,
            Coercion::Check(k) | Coercion::AtLeast(k) => Some(k),
        }
    }
}

/// One explicit dimension token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DimSpec {
    /// `N`: the dimension is exactly `N`.
    Exact(usize),
    /// `+N`: insert a new dimension `N` (outputs only).
    Insert(usize),
    /// `-N` or `-`: skip a reference dimension, checking its size when given
    /// (outputs only).
    Remove(Option<usize>),
    /// `=`: same as the corresponding reference dimension.
    Copy,
    /// `:`: any single dimension on inputs; a copy on outputs.
    Any,
}

/// What happens to the dimensions after the explicit ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tail {
    /// `&`: the remaining reference dimensions. Inputs may broadcast.
    Same,
    /// `#`: the same element count as the reference, any shape.
    Count,
    /// `*`: anything (inputs only).
    Any,
}

impl Tail {
    const fn code(self) -> char {
        match self {
            Tail::Same => '&',
            Tail::Count => '#',
            Tail::Any => '*',
        }
    }
}

/// One parsed clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArgClause {
    pub direction: Direction,
    pub coercion: Coercion,
    /// Clause whose resolved shape and kind this one is measured against.
    pub reference: Option<usize>,
    /// Input clause whose *values* are the reference dimensions.
    pub template: Option<usize>,
    pub dims: Vec<DimSpec>,
    pub tail: Option<Tail>,
    pub optional: bool,
}

impl ArgClause {
    /// A scalar clause has neither dimension tokens nor a rest token.
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty() && self.tail.is_none()
    }

    /// Whether shape checking or derivation reads reference dimensions.
    pub fn needs_reference_dims(&self) -> bool {
        let dim_needs = self.dims.iter().any(|d| match d {
            DimSpec::Copy | DimSpec::Remove(_) => true,
            DimSpec::Any => !self.direction.is_input(),
            DimSpec::Exact(_) | DimSpec::Insert(_) => false,
        });
        dim_needs || matches!(self.tail, Some(Tail::Same) | Some(Tail::Count))
    }

    /// Whether the element kind depends on the reference kind.
    pub fn needs_reference_kind(&self) -> bool {
        !self.direction.is_input() && matches!(self.coercion, Coercion::None)
    }
}

// ============================================================================
// FormatSpec
// ============================================================================

/// A parsed format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatSpec {
    clauses: Vec<ArgClause>,
}

impl FormatSpec {
    pub fn clauses(&self) -> &[ArgClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgClause> {
        self.clauses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgClause> {
        self.clauses.iter()
    }

    pub fn input_count(&self) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.direction == Direction::Input)
            .count()
    }

    /// Number of argument slots: input and output clauses.
    pub fn slot_count(&self) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.direction != Direction::Return)
            .count()
    }

    /// Number of leading slots the caller must supply.
    pub fn required_slots(&self) -> usize {
        self.clauses
            .iter()
            .rposition(|c| c.direction != Direction::Return && !c.optional)
            .map_or(0, |i| i + 1)
    }

    pub fn return_index(&self) -> Option<usize> {
        self.clauses
            .iter()
            .position(|c| c.direction == Direction::Return)
    }
}

impl FromStr for FormatSpec {
    type Err = ArgsError;

    fn from_str(s: &str) -> Result<Self> {
        parse_format(s)
    }
}

impl<'a> IntoIterator for &'a FormatSpec {
    type Item = &'a ArgClause;
    type IntoIter = std::slice::Iter<'a, ArgClause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, clause) in self.clauses.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", clause.direction.code())?;
            match clause.coercion {
                Coercion::None => {}
                Coercion::Check(k) => write!(f, "{}", k.letter())?,
                Coercion::AtLeast(k) => write!(f, ">{}", k.letter())?,
            }
            if let Some(k) = clause.reference {
                if Some(k) != index.checked_sub(1) {
                    write!(f, "[{k}]")?;
                }
            }
            if let Some(k) = clause.template {
                write!(f, "{{{k}}}")?;
            }
            for (i, dim) in clause.dims.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match dim {
                    DimSpec::Exact(n) => write!(f, "{n}")?,
                    DimSpec::Insert(n) => write!(f, "+{n}")?,
                    DimSpec::Remove(Some(n)) => write!(f, "-{n}")?,
                    DimSpec::Remove(None) => f.write_str("-")?,
                    DimSpec::Copy => f.write_str("=")?,
                    DimSpec::Any => f.write_str(":")?,
                }
            }
            if let Some(tail) = clause.tail {
                write!(f, "{}", tail.code())?;
            }
            if clause.optional {
                f.write_str("?")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parse a format specification such as `"i>D*;i>D&;rD&"`.
pub fn parse_format(spec: &str) -> Result<FormatSpec> {
    let mut parser = Parser {
        spec,
        bytes: spec.as_bytes(),
        pos: 0,
    };
    if parser.bytes.is_empty() {
        return Err(parser.fail("empty specification"));
    }
    let mut clauses = Vec::new();
    loop {
        let clause = parser.clause(&clauses)?;
        clauses.push(clause);
        match parser.peek() {
            None => break,
            Some(b';') => parser.bump(),
            Some(_) => return Err(parser.fail("unexpected character")),
        }
    }
    Ok(FormatSpec { clauses })
}

struct Parser<'a> {
    spec: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn fail(&self, reason: &'static str) -> ArgsError {
        ArgsError::MalformedSpec {
            spec: self.spec.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<Option<usize>> {
        let start = self.pos;
        let mut value: usize = 0;
        while let Some(c @ b'0'..=b'9') = self.peek() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(usize::from(c - b'0')))
                .ok_or_else(|| self.fail("number too large"))?;
            self.bump();
        }
        Ok((self.pos > start).then_some(value))
    }

    fn extent(&mut self) -> Result<usize> {
        match self.number()? {
            Some(0) => Err(self.fail("zero extent")),
            Some(n) => Ok(n),
            None => Err(self.fail("expected a number")),
        }
    }

    fn index(&mut self, close: u8, index: usize) -> Result<usize> {
        let k = self
            .number()?
            .ok_or_else(|| self.fail("expected a clause index"))?;
        if !self.eat(close) {
            return Err(self.fail("unterminated clause index"));
        }
        if k >= index {
            return Err(self.fail("reference must name an earlier clause"));
        }
        Ok(k)
    }

    fn letter(&mut self) -> Option<ElementKind> {
        let kind = self.peek().and_then(|c| ElementKind::from_letter(c as char))?;
        self.bump();
        Some(kind)
    }

    fn clause(&mut self, previous: &[ArgClause]) -> Result<ArgClause> {
        let index = previous.len();
        if previous.iter().any(|c| c.direction == Direction::Return) {
            return Err(self.fail("return clause must be last"));
        }

        let direction = match self.peek() {
            Some(b'i') => Direction::Input,
            Some(b'o') => Direction::Output,
            Some(b'r') => Direction::Return,
            _ => return Err(self.fail("expected 'i', 'o' or 'r'")),
        };
        self.bump();

        let coercion = if self.eat(b'>') {
            match self.letter() {
                Some(kind) => Coercion::AtLeast(kind),
                None => return Err(self.fail("expected a type letter after '>'")),
            }
        } else {
            self.letter().map_or(Coercion::None, Coercion::Check)
        };

        let mut reference = index.checked_sub(1);
        if self.eat(b'[') {
            reference = Some(self.index(b']', index)?);
        }
        let mut template = None;
        if self.eat(b'{') {
            let k = self.index(b'}', index)?;
            if !previous[k].direction.is_input() {
                return Err(self.fail("template must be an input clause"));
            }
            template = Some(k);
        }

        let (dims, tail) = self.dims(direction)?;
        let optional = self.eat(b'?');

        let clause = ArgClause {
            direction,
            coercion,
            reference,
            template,
            dims,
            tail,
            optional,
        };
        self.check(&clause, previous)?;
        Ok(clause)
    }

    fn dims(&mut self, direction: Direction) -> Result<(Vec<DimSpec>, Option<Tail>)> {
        let mut dims = Vec::new();
        let mut tail = None;
        loop {
            let token = self.peek();
            let shape_token = matches!(
                token,
                Some(b'0'..=b'9' | b'+' | b'-' | b'=' | b':' | b'&' | b'#' | b'*' | b',')
            );
            if tail.is_some() && shape_token {
                return Err(self.fail("shape token after rest token"));
            }
            match token {
                Some(b'0'..=b'9') => dims.push(DimSpec::Exact(self.extent()?)),
                Some(b'+') => {
                    self.bump();
                    dims.push(DimSpec::Insert(self.extent()?));
                }
                Some(b'-') => {
                    self.bump();
                    let size = match self.number()? {
                        Some(0) => return Err(self.fail("zero extent")),
                        size => size,
                    };
                    dims.push(DimSpec::Remove(size));
                }
                Some(b'=') => {
                    self.bump();
                    dims.push(DimSpec::Copy);
                }
                Some(b':') => {
                    self.bump();
                    dims.push(DimSpec::Any);
                }
                Some(b',') if !dims.is_empty() => {
                    self.bump();
                    if !matches!(self.peek(), Some(b'0'..=b'9' | b'+' | b'-' | b'=' | b':')) {
                        return Err(self.fail("',' must be followed by a dimension"));
                    }
                }
                Some(b'&') => {
                    self.bump();
                    tail = Some(Tail::Same);
                }
                Some(b'#') => {
                    self.bump();
                    tail = Some(Tail::Count);
                }
                Some(b'*') => {
                    self.bump();
                    tail = Some(Tail::Any);
                }
                _ => break,
            }
            if dims.len() > MAX_DIMS {
                return Err(self.fail("too many dimensions"));
            }
        }

        let adds_dims = dims
            .iter()
            .any(|d| matches!(d, DimSpec::Insert(_) | DimSpec::Remove(_)));
        if direction.is_input() && adds_dims {
            return Err(self.fail("'+' and '-' apply to outputs only"));
        }
        if !direction.is_input() && tail == Some(Tail::Any) {
            return Err(self.fail("'*' applies to inputs only"));
        }
        if tail == Some(Tail::Count) && !dims.is_empty() {
            return Err(self.fail("'#' must be the only shape token"));
        }
        Ok((dims, tail))
    }

    fn check(&self, clause: &ArgClause, previous: &[ArgClause]) -> Result<()> {
        if clause.direction == Direction::Return && clause.optional {
            return Err(self.fail("return clause cannot be optional"));
        }
        if clause.needs_reference_dims() {
            match (clause.template, clause.reference) {
                (Some(_), _) => {}
                (None, Some(k)) => {
                    if clause.direction.is_input() && !previous[k].direction.is_input() {
                        return Err(self.fail("input reference must be an input clause"));
                    }
                }
                (None, None) => return Err(self.fail("clause needs a reference")),
            }
        }
        if clause.needs_reference_kind() && clause.reference.is_none() {
            return Err(self.fail("output without a type needs a reference"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(spec: &str) -> &'static str {
        match parse_format(spec) {
            Err(ArgsError::MalformedSpec { reason, .. }) => reason,
            other => panic!("expected malformed spec for {spec:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unary() {
        let spec = parse_format("i>D*;rD&").unwrap();
        assert_eq!(spec.len(), 2);
        let input = &spec.clauses()[0];
        assert_eq!(input.direction, Direction::Input);
        assert_eq!(input.coercion, Coercion::AtLeast(ElementKind::Float64));
        assert_eq!(input.reference, None);
        assert_eq!(input.tail, Some(Tail::Any));
        let ret = &spec.clauses()[1];
        assert_eq!(ret.direction, Direction::Return);
        assert_eq!(ret.coercion, Coercion::Check(ElementKind::Float64));
        assert_eq!(ret.reference, Some(0));
        assert_eq!(ret.tail, Some(Tail::Same));
        assert_eq!(spec.slot_count(), 1);
        assert_eq!(spec.return_index(), Some(1));
    }

    #[test]
    fn test_parse_dimension_tokens() {
        let spec = parse_format("i>D3*;rD-3&").unwrap();
        assert_eq!(spec.clauses()[0].dims, vec![DimSpec::Exact(3)]);
        assert_eq!(spec.clauses()[1].dims, vec![DimSpec::Remove(Some(3))]);

        let spec = parse_format("i>D2,2*;oD+3,=,-&").unwrap();
        assert_eq!(spec.clauses()[0].dims, vec![DimSpec::Exact(2), DimSpec::Exact(2)]);
        assert_eq!(
            spec.clauses()[1].dims,
            vec![DimSpec::Insert(3), DimSpec::Copy, DimSpec::Remove(None)]
        );
    }

    #[test]
    fn test_parse_references() {
        let spec = parse_format("iL*;iD*;oD[0]&;rD{0}&").unwrap();
        assert_eq!(spec.clauses()[2].reference, Some(0));
        assert_eq!(spec.clauses()[3].template, Some(0));
        assert_eq!(spec.clauses()[3].reference, Some(2));
    }

    #[test]
    fn test_parse_optional_and_scalar() {
        let spec = parse_format("iD*;iL?;oD&?").unwrap();
        assert!(spec.clauses()[0].tail == Some(Tail::Any));
        assert!(spec.clauses()[1].is_scalar());
        assert!(spec.clauses()[1].optional);
        assert_eq!(spec.required_slots(), 1);
        assert_eq!(spec.slot_count(), 3);
        assert_eq!(spec.input_count(), 2);
    }

    #[test]
    fn test_display_round_trips() {
        for s in [
            "i>D*;rD&",
            "i>D3*;rD-3&",
            "i>D2,2*;i>D2,2&;rD2,2&",
            "iL*;rD{0}&",
            "iD*;iL?;oD[0]+3,=,-&?",
            "iD*;i#;rZ#",
        ] {
            let spec = parse_format(s).unwrap();
            assert_eq!(spec.to_string(), s);
            assert_eq!(parse_format(&spec.to_string()).unwrap(), spec);
        }
    }

    #[test]
    fn test_malformed_specs() {
        assert_eq!(malformed(""), "empty specification");
        assert_eq!(malformed("x"), "expected 'i', 'o' or 'r'");
        assert_eq!(malformed("i>*"), "expected a type letter after '>'");
        assert_eq!(malformed("iD*;"), "expected 'i', 'o' or 'r'");
        assert_eq!(malformed("iD&"), "clause needs a reference");
        assert_eq!(malformed("iD*;rD[1]&"), "reference must name an earlier clause");
        assert_eq!(malformed("rD;iD"), "return clause must be last");
        assert_eq!(malformed("iD+3*"), "'+' and '-' apply to outputs only");
        assert_eq!(malformed("iD*;rD*"), "'*' applies to inputs only");
        assert_eq!(malformed("iD*;rD3#"), "'#' must be the only shape token");
        assert_eq!(malformed("iD*;rD&3"), "shape token after rest token");
        assert_eq!(malformed("iD0"), "zero extent");
        assert_eq!(malformed("iD2,,3*"), "',' must be followed by a dimension");
        assert_eq!(malformed("iD2,&;rD&"), "',' must be followed by a dimension");
        assert_eq!(malformed("iD2,"), "',' must be followed by a dimension");
        assert_eq!(malformed("iD*;rD&x"), "unexpected character");
        assert_eq!(malformed("iD*;oD*;iD&"), "'*' applies to inputs only");
        assert_eq!(malformed("iD*;oD&;iD&"), "input reference must be an input clause");
        assert_eq!(malformed("iD*;rD&?"), "return clause cannot be optional");
        assert_eq!(malformed("oD&"), "clause needs a reference");
        assert_eq!(malformed("iD*;oD{1}&"), "reference must name an earlier clause");
    }

    #[test]
    fn test_offset_points_at_problem() {
        match parse_format("i>D*;rX&") {
            Err(ArgsError::MalformedSpec { offset, .. }) => assert_eq!(offset, 6),
            other => panic!("unexpected {other:?}"),
        }
    }
}
