//! Numeric element kinds and kind-tagged scalar values.

use num_complex::{Complex32, Complex64};
use num_traits::{AsPrimitive, Zero};

use crate::symbol::ArrayData;

/// Numeric element kinds, in increasing promotion rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    Float32 = 4,
    Float64 = 5,
    CFloat32 = 6,
    CFloat64 = 7,
}

impl ElementKind {
    /// All kinds, lowest rank first.
    pub const ALL: [ElementKind; 8] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::CFloat32,
        Self::CFloat64,
    ];

    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::Float32 => 4,
            Self::Float64 => 8,
            Self::CFloat32 => 8,
            Self::CFloat64 => 16,
        }
    }

    /// Promotion rank; a value converts upward to any kind of higher rank.
    pub const fn rank(self) -> u8 {
        self as u8
    }

    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Integer and floating-point kinds.
    pub const fn is_real(self) -> bool {
        !self.is_complex()
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, Self::CFloat32 | Self::CFloat64)
    }

    /// Single-letter code used in format specifications.
    pub const fn letter(self) -> char {
        match self {
            Self::Int8 => 'B',
            Self::Int16 => 'W',
            Self::Int32 => 'L',
            Self::Int64 => 'Q',
            Self::Float32 => 'F',
            Self::Float64 => 'D',
            Self::CFloat32 => 'C',
            Self::CFloat64 => 'Z',
        }
    }

    pub const fn from_letter(c: char) -> Option<Self> {
        match c {
            'B' => Some(Self::Int8),
            'W' => Some(Self::Int16),
            'L' => Some(Self::Int32),
            'Q' => Some(Self::Int64),
            'F' => Some(Self::Float32),
            'D' => Some(Self::Float64),
            'C' => Some(Self::CFloat32),
            'Z' => Some(Self::CFloat64),
            _ => None,
        }
    }

    /// Name as shown in LUX diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "BYTE",
            Self::Int16 => "WORD",
            Self::Int32 => "LONG",
            Self::Int64 => "INT64",
            Self::Float32 => "FLOAT",
            Self::Float64 => "DOUBLE",
            Self::CFloat32 => "CFLOAT",
            Self::CFloat64 => "CDOUBLE",
        }
    }

    /// Least upper bound of two kinds.
    ///
    /// The higher-ranked kind wins, except that `Float64` combined with
    /// `CFloat32` needs `CFloat64` to keep the double precision.
    pub fn promote(self, other: Self) -> Self {
        match (self, other) {
            (Self::Float64, Self::CFloat32) | (Self::CFloat32, Self::Float64) => Self::CFloat64,
            _ => self.max(other),
        }
    }

    /// Least upper bound of a list of kinds.
    pub fn promote_all(kinds: &[Self]) -> Option<Self> {
        let (&first, rest) = kinds.split_first()?;
        Some(rest.iter().fold(first, |acc, &k| acc.promote(k)))
    }

    /// Whether a value of this kind converts to `to` without narrowing.
    pub fn can_promote_to(self, to: Self) -> bool {
        self.promote(to) == to
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Element trait
// ============================================================================

/// A Rust type that is the storage of one [`ElementKind`].
pub trait Element: Copy + Zero + std::fmt::Debug + 'static {
    const KIND: ElementKind;

    fn into_scalar(self) -> Scalar;

    /// Convert a scalar of any kind into this element type.
    fn from_scalar(value: Scalar) -> Self;

    fn wrap_vec(values: Vec<Self>) -> ArrayData;

    fn unwrap_slice(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const KIND: ElementKind = ElementKind::$variant;

            #[inline]
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            #[inline]
            fn from_scalar(value: Scalar) -> Self {
                match value.convert(ElementKind::$variant) {
                    Scalar::$variant(v) => v,
                    _ => unreachable!("Scalar::convert returns the requested kind"),
                }
            }

            #[inline]
            fn wrap_vec(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            #[inline]
            fn unwrap_slice(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
impl_element!(Complex32, CFloat32);
impl_element!(Complex64, CFloat64);

// ============================================================================
// Scalar
// ============================================================================

/// One numeric value tagged with its element kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    CFloat32(Complex32),
    CFloat64(Complex64),
}

impl Scalar {
    pub fn kind(&self) -> ElementKind {
        match self {
            Scalar::Int8(_) => ElementKind::Int8,
            Scalar::Int16(_) => ElementKind::Int16,
            Scalar::Int32(_) => ElementKind::Int32,
            Scalar::Int64(_) => ElementKind::Int64,
            Scalar::Float32(_) => ElementKind::Float32,
            Scalar::Float64(_) => ElementKind::Float64,
            Scalar::CFloat32(_) => ElementKind::CFloat32,
            Scalar::CFloat64(_) => ElementKind::CFloat64,
        }
    }

    /// Zero of the given kind.
    pub fn zero(kind: ElementKind) -> Scalar {
        Scalar::Int8(0).convert(kind)
    }

    /// Value as an integer; floats truncate toward zero, complex values use
    /// the real part.
    pub fn to_i64(&self) -> i64 {
        match *self {
            Scalar::Int8(v) => v.as_(),
            Scalar::Int16(v) => v.as_(),
            Scalar::Int32(v) => v.as_(),
            Scalar::Int64(v) => v,
            Scalar::Float32(v) => v.as_(),
            Scalar::Float64(v) => v.as_(),
            Scalar::CFloat32(v) => v.re.as_(),
            Scalar::CFloat64(v) => v.re.as_(),
        }
    }

    /// Value as a double; complex values use the real part.
    pub fn to_f64(&self) -> f64 {
        self.to_complex().re
    }

    pub fn to_complex(&self) -> Complex64 {
        match *self {
            Scalar::Int8(v) => Complex64::new(v.as_(), 0.0),
            Scalar::Int16(v) => Complex64::new(v.as_(), 0.0),
            Scalar::Int32(v) => Complex64::new(v.as_(), 0.0),
            Scalar::Int64(v) => Complex64::new(v.as_(), 0.0),
            Scalar::Float32(v) => Complex64::new(v.as_(), 0.0),
            Scalar::Float64(v) => Complex64::new(v, 0.0),
            Scalar::CFloat32(v) => Complex64::new(v.re.as_(), v.im.as_()),
            Scalar::CFloat64(v) => v,
        }
    }

    /// Convert to `kind`.
    ///
    /// Follows [`AsPrimitive`] semantics: values that fit are kept exactly,
    /// narrowing integer casts wrap, and float-to-integer casts truncate
    /// toward zero and saturate.
    pub fn convert(self, kind: ElementKind) -> Scalar {
        if self.kind() == kind {
            return self;
        }
        if self.kind().is_integer() {
            return cast_from(self.to_i64(), kind);
        }
        let c = self.to_complex();
        match kind {
            ElementKind::CFloat32 => Scalar::CFloat32(Complex32::new(c.re.as_(), c.im.as_())),
            ElementKind::CFloat64 => Scalar::CFloat64(c),
            _ => cast_from(c.re, kind),
        }
    }
}

/// A real value cast to `kind`, with a zero imaginary part for complex kinds.
fn cast_from<T>(v: T, kind: ElementKind) -> Scalar
where
    T: AsPrimitive<i8> + AsPrimitive<i16> + AsPrimitive<i32> + AsPrimitive<i64>,
    T: AsPrimitive<f32> + AsPrimitive<f64>,
{
    match kind {
        ElementKind::Int8 => Scalar::Int8(v.as_()),
        ElementKind::Int16 => Scalar::Int16(v.as_()),
        ElementKind::Int32 => Scalar::Int32(v.as_()),
        ElementKind::Int64 => Scalar::Int64(v.as_()),
        ElementKind::Float32 => Scalar::Float32(v.as_()),
        ElementKind::Float64 => Scalar::Float64(v.as_()),
        ElementKind::CFloat32 => Scalar::CFloat32(Complex32::new(v.as_(), 0.0)),
        ElementKind::CFloat64 => Scalar::CFloat64(Complex64::new(v.as_(), 0.0)),
    }
}

macro_rules! impl_from_for_scalar {
    ($($t:ty => $variant:ident),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::$variant(v)
            }
        })*
    };
}

impl_from_for_scalar!(
    i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    f32 => Float32, f64 => Float64, Complex32 => CFloat32, Complex64 => CFloat64
);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sizes() {
        let sizes: Vec<usize> = ElementKind::ALL.iter().map(|k| k.size()).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8, 4, 8, 8, 16]);
    }

    #[test]
    fn test_letters_round_trip() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_letter(kind.letter()), Some(kind));
        }
        assert_eq!(ElementKind::from_letter('X'), None);
    }

    #[test]
    fn test_promote() {
        use ElementKind::*;
        assert_eq!(Int8.promote(Int32), Int32);
        assert_eq!(Int64.promote(Float32), Float32);
        assert_eq!(Float64.promote(Float32), Float64);
        assert_eq!(Float64.promote(CFloat32), CFloat64);
        assert_eq!(CFloat32.promote(Float64), CFloat64);
        assert_eq!(CFloat32.promote(Float32), CFloat32);
        assert_eq!(ElementKind::promote_all(&[Int16, Float32, Int8]), Some(Float32));
        assert_eq!(ElementKind::promote_all(&[]), None);
    }

    #[test]
    fn test_can_promote_to_never_narrows() {
        use ElementKind::*;
        assert!(Int32.can_promote_to(Float64));
        assert!(Float64.can_promote_to(Float64));
        assert!(!Float64.can_promote_to(Int32));
        assert!(!Float64.can_promote_to(CFloat32));
        assert!(!CFloat32.can_promote_to(Float64));
    }

    #[test]
    fn test_scalar_convert() {
        let s = Scalar::Int16(-7);
        assert_eq!(s.convert(ElementKind::Int64), Scalar::Int64(-7));
        assert_eq!(s.convert(ElementKind::Float64), Scalar::Float64(-7.0));
        let c = Scalar::Float64(2.5).convert(ElementKind::CFloat64);
        assert_eq!(c, Scalar::CFloat64(Complex64::new(2.5, 0.0)));
        assert_eq!(Scalar::Float64(2.9).convert(ElementKind::Int32), Scalar::Int32(2));
    }

    #[test]
    fn test_scalar_convert_narrowing() {
        assert_eq!(Scalar::Int32(300).convert(ElementKind::Int8), Scalar::Int8(44));
        assert_eq!(Scalar::Float64(1e10).convert(ElementKind::Int16), Scalar::Int16(i16::MAX));
        assert_eq!(Scalar::Float32(-3.7).convert(ElementKind::Int64), Scalar::Int64(-3));
        assert_eq!(Scalar::Float64(f64::NAN).convert(ElementKind::Int32), Scalar::Int32(0));
        let c = Scalar::CFloat64(Complex64::new(1.5, -2.0)).convert(ElementKind::CFloat32);
        assert_eq!(c, Scalar::CFloat32(Complex32::new(1.5, -2.0)));
    }

    #[test]
    fn test_element_from_scalar() {
        assert_abs_diff_eq!(f64::from_scalar(Scalar::Int32(3)), 3.0);
        assert_eq!(i32::from_scalar(Scalar::Float32(4.75)), 4);
        let z = Complex32::from_scalar(Scalar::Float64(1.5));
        assert_abs_diff_eq!(z.re, 1.5);
        assert_abs_diff_eq!(z.im, 0.0);
        assert_eq!(Scalar::zero(ElementKind::Float32), Scalar::Float32(0.0));
    }
}
