use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Exception categories raised by the integer core.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `ArgumentError` -> "ArgumentError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Root of the hierarchy.
    Exception,
    /// Base class for errors a program is expected to rescue.
    StandardError,

    /// Malformed numerals and out-of-range radixes.
    ArgumentError,
    /// Division or modulo by zero.
    ZeroDivisionError,

    // --- RangeError hierarchy ---
    RangeError,
    /// Subclass of RangeError - converting NaN or infinity to an integer.
    FloatDomainError,

    /// Heap exhaustion. Not a StandardError: a plain rescue does not catch it.
    NoMemoryError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// - `Exception` matches everything
    /// - `StandardError` matches everything except `NoMemoryError`
    /// - `RangeError` is the base for `FloatDomainError`
    ///
    /// Returns true if `self` would be caught by a handler for `handler_type`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::Exception => true,
            Self::StandardError => !matches!(self, Self::Exception | Self::NoMemoryError),
            Self::RangeError => matches!(self, Self::FloatDomainError),
            _ => false,
        }
    }

    /// Creates a ZeroDivisionError naming the operation and its operands.
    ///
    /// The message keeps the conventional `divided by 0` prefix so existing
    /// handlers that match on it keep working.
    #[must_use]
    pub fn zero_division(op: impl fmt::Display, lhs: impl fmt::Display) -> SimpleException {
        SimpleException::new_msg(Self::ZeroDivisionError, format_args!("divided by 0 ({lhs} {op} 0)"))
    }

    /// Creates an ArgumentError for a string that is not a valid integer numeral.
    #[must_use]
    pub fn invalid_numeral(text: &str) -> SimpleException {
        SimpleException::new_msg(Self::ArgumentError, format_args!("invalid value for Integer(): {text:?}"))
    }

    /// Creates an ArgumentError for a radix outside `2..=36`.
    #[must_use]
    pub fn invalid_radix(radix: u32) -> SimpleException {
        SimpleException::new_msg(Self::ArgumentError, format_args!("invalid radix {radix}"))
    }

    /// Creates a FloatDomainError for converting a non-finite float.
    ///
    /// Renders the float the way the runtime prints it: `NaN`, `Infinity`, `-Infinity`.
    #[must_use]
    pub fn float_domain(value: f64) -> SimpleException {
        let text = if value.is_nan() {
            "NaN"
        } else if value.is_sign_negative() {
            "-Infinity"
        } else {
            "Infinity"
        };
        SimpleException::new_msg(Self::FloatDomainError, text)
    }
}

/// A raised exception: its category plus an optional message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    /// Creates a new exception with the given type and optional argument message.
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    /// Creates a new exception with the given type and argument message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl fmt::Display) -> Self {
        Self {
            exc_type,
            arg: Some(arg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    /// Consumes the exception and returns its message, if any.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.arg
    }
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

impl std::error::Error for SimpleException {}

/// Error produced by integer operations.
///
/// `Exc` is a domain error the host may rescue; `UncatchableExc` is a resource
/// failure (heap exhaustion) that must unwind to the top-level handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Exc(SimpleException),
    UncatchableExc(SimpleException),
}

impl RunError {
    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        match self {
            Self::Exc(exc) | Self::UncatchableExc(exc) => exc.exc_type(),
        }
    }

    /// Whether an enclosing recovery construct is allowed to handle this error.
    #[must_use]
    pub fn is_catchable(&self) -> bool {
        matches!(self, Self::Exc(_))
    }

    /// Returns the underlying exception regardless of catchability.
    #[must_use]
    pub fn into_exception(self) -> SimpleException {
        match self {
            Self::Exc(exc) | Self::UncatchableExc(exc) => exc,
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(exc)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exc(exc) | Self::UncatchableExc(exc) => write!(f, "{exc}"),
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn float_domain_errors_are_range_errors() {
        assert!(ExcType::FloatDomainError.is_subclass_of(ExcType::RangeError));
        assert!(ExcType::FloatDomainError.is_subclass_of(ExcType::StandardError));
        assert!(!ExcType::ZeroDivisionError.is_subclass_of(ExcType::RangeError));
    }

    #[test]
    fn no_memory_is_not_a_standard_error() {
        assert!(!ExcType::NoMemoryError.is_subclass_of(ExcType::StandardError));
        assert!(ExcType::NoMemoryError.is_subclass_of(ExcType::Exception));
    }

    #[test]
    fn exc_type_names_round_trip_through_strum() {
        let name: &'static str = ExcType::ZeroDivisionError.into();
        assert_eq!(name, "ZeroDivisionError");
        assert_eq!(ExcType::from_str("FloatDomainError").unwrap(), ExcType::FloatDomainError);
    }

    #[test]
    fn zero_division_message_names_operation() {
        let exc = ExcType::zero_division("/", -7);
        assert_eq!(exc.to_string(), "ZeroDivisionError: divided by 0 (-7 / 0)");
    }

    #[test]
    fn float_domain_message_matches_float_rendering() {
        assert_eq!(ExcType::float_domain(f64::NAN).arg(), Some("NaN"));
        assert_eq!(ExcType::float_domain(f64::NEG_INFINITY).arg(), Some("-Infinity"));
        assert_eq!(ExcType::float_domain(f64::INFINITY).arg(), Some("Infinity"));
    }
}
