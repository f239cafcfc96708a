//! Utility macros and argument coercion helpers shared by the value types.
//!
//! The message types accept loosely typed arguments in a few places (ports and
//! status codes may be given as integers or numeric strings). The helpers in
//! this module turn those arguments into validated values, or a
//! [`MessageError::InvalidArgument`] describing what was wrong.

use crate::error::MessageError;

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's useful for validation checks where you want to return early with an error
/// if some condition is not satisfied.
///
/// # Arguments
///
/// * `$predicate` - A boolean expression that should evaluate to true
/// * `$error` - The error value to return if the predicate is false
///
/// # Example
///
/// ```ignore
/// ensure!(port <= 65535, MessageError::invalid_argument("port out of range"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// An argument that can be coerced into an integer.
///
/// Integers convert losslessly (or fail when they do not fit an `i64`). Strings follow
/// the usual "numeric string" rules: surrounding whitespace is ignored, an optional sign,
/// digits with an optional fraction and exponent. Fractions are truncated toward zero,
/// so `"80.9"` becomes `80`.
pub trait NumericArg {
    /// Returns the integer value of this argument.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] when the value is not numeric or does
    /// not fit into an `i64`.
    fn to_numeric(&self) -> Result<i64, MessageError>;
}

macro_rules! impl_numeric_arg {
    ($($ty:ty),*) => {
        $(
            impl NumericArg for $ty {
                #[inline]
                fn to_numeric(&self) -> Result<i64, MessageError> {
                    i64::try_from(*self)
                        .map_err(|e| MessageError::invalid_argument(format!("{self} is not a valid integer: {e}")))
                }
            }
        )*
    };
}

impl_numeric_arg!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl NumericArg for f64 {
    fn to_numeric(&self) -> Result<i64, MessageError> {
        truncate_float(*self).ok_or_else(|| MessageError::invalid_argument(format!("{self} is not a valid integer")))
    }
}

impl NumericArg for str {
    fn to_numeric(&self) -> Result<i64, MessageError> {
        parse_numeric(self).ok_or_else(|| MessageError::invalid_argument(format!("{self:?} is not numeric")))
    }
}

impl NumericArg for &str {
    fn to_numeric(&self) -> Result<i64, MessageError> {
        (**self).to_numeric()
    }
}

impl NumericArg for String {
    fn to_numeric(&self) -> Result<i64, MessageError> {
        self.as_str().to_numeric()
    }
}

fn truncate_float(value: f64) -> Option<i64> {
    // i64::MAX is not representable as f64, so compare against 2^63 exclusively
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated >= LIMIT || truncated < -LIMIT {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, reason = "range is checked above")]
    Some(truncated as i64)
}

fn parse_numeric(input: &str) -> Option<i64> {
    let trimmed = input.trim_matches(|c: char| c.is_ascii_whitespace());
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    if !is_numeric_literal(trimmed) {
        return None;
    }

    trimmed.parse::<f64>().ok().and_then(truncate_float)
}

/// Accepts `[+-]digits[.digits][(e|E)[+-]digits]`, at least one mantissa digit required.
fn is_numeric_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }

    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Coerces `value` into a TCP/UDP port number.
pub(crate) fn port_from<P: NumericArg + ?Sized>(value: &P) -> Result<u16, MessageError> {
    let port = value.to_numeric()?;
    u16::try_from(port).map_err(|_| MessageError::invalid_argument(format!("port {port} is outside 0..=65535")))
}

/// Rejects strings carrying ASCII control characters, which can never be part of a
/// header-safe or URI-safe argument.
pub(crate) fn required_str<'a>(value: &'a str, what: &str) -> Result<&'a str, MessageError> {
    ensure!(
        !value.bytes().any(|b| b.is_ascii_control()),
        MessageError::invalid_argument(format!("{what} must not contain control characters: {value:?}"))
    );
    Ok(value)
}
