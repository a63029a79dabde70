use lux_view::LuxError;

/// Sentinel a binding function returns to the interpreter on failure.
pub const LUX_ERROR: i32 = -1;

/// Errors from parsing format specifications, binding arguments, or
/// dispatching registered bindings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    /// The format specification itself is invalid. This is a bug in the
    /// binding, not in the caller's arguments.
    #[error("malformed format specification {spec:?} at offset {offset}: {reason}")]
    MalformedSpec {
        spec: String,
        offset: usize,
        reason: &'static str,
    },

    #[error(transparent)]
    Lux(#[from] LuxError),

    #[error("unknown binding '{0}'")]
    UnknownBinding(String),

    #[error("binding '{0}' registered twice")]
    DuplicateBinding(&'static str),
}

impl ArgsError {
    /// The value a binding function hands back to the interpreter.
    pub const fn sentinel(&self) -> i32 {
        LUX_ERROR
    }

    /// Stable out-of-band error code for the interpreter's error channel.
    pub fn code(&self) -> u16 {
        match self {
            ArgsError::MalformedSpec { .. } => 1,
            ArgsError::UnknownBinding(_) => 2,
            ArgsError::DuplicateBinding(_) => 3,
            ArgsError::Lux(e) => match e {
                LuxError::IllegalClass { .. } => 10,
                LuxError::IllegalType { .. } => 11,
                LuxError::IllegalNumberOfDimensions { .. } => 12,
                LuxError::IncompatibleDimensions { .. } => 13,
                LuxError::IncompatibleArgument { .. } => 14,
                LuxError::NeedScalar { .. } => 15,
                LuxError::NeedArray { .. } => 16,
                LuxError::NeedNamedVariable { .. } => 17,
                LuxError::IllegalAxis { .. } => 18,
                LuxError::AllocationError { .. } => 19,
                LuxError::WrongNumberOfArguments { .. } => 20,
            },
        }
    }

    /// Whether the error is a binding-author bug rather than a user error.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            ArgsError::MalformedSpec { .. }
                | ArgsError::UnknownBinding(_)
                | ArgsError::DuplicateBinding(_)
        )
    }
}

/// Convenience alias for `Result<T, ArgsError>`.
pub type Result<T> = std::result::Result<T, ArgsError>;
