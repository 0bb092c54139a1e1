//! Inline integer arithmetic over `i64` with explicit overflow detection.
//!
//! Every arithmetic helper returns `None` when the mathematical result leaves
//! `[i64::MIN, i64::MAX]`. `None` never means "wrapped"; it means the caller must
//! redo the operation on the Kernel (see [`crate::policy`]).

use std::borrow::Cow;

use crate::exception::{ExcType, RunResult};

/// Smallest radix accepted by parsing and formatting.
pub const MIN_RADIX: u32 = 2;
/// Largest radix accepted by parsing and formatting (`0-9` then `a-z`).
pub const MAX_RADIX: u32 = 36;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[inline]
pub(crate) fn add(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}

#[inline]
pub(crate) fn sub(a: i64, b: i64) -> Option<i64> {
    a.checked_sub(b)
}

#[inline]
pub(crate) fn mul(a: i64, b: i64) -> Option<i64> {
    a.checked_mul(b)
}

#[inline]
pub(crate) fn negate(a: i64) -> Option<i64> {
    a.checked_neg()
}

#[inline]
pub(crate) fn abs(a: i64) -> Option<i64> {
    a.checked_abs()
}

/// Floor division: the quotient rounds toward negative infinity.
///
/// Returns `None` for a zero divisor as well as for `i64::MIN / -1`; callers
/// reject zero divisors before reaching the compact path.
pub(crate) fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    // `checked_div` succeeded, so `b` is neither 0 nor the MIN / -1 pair
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { Some(q - 1) } else { Some(q) }
}

/// Floor modulo: a non-zero result carries the sign of the divisor.
pub(crate) fn floor_mod(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    // i64::MIN % -1 overflows in Rust even though the answer is 0
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) { Some(r + b) } else { Some(r) }
}

#[inline]
pub(crate) fn is_odd(a: i64) -> bool {
    a & 1 != 0
}

/// Validates a radix for parsing or formatting.
pub(crate) fn check_radix(radix: u32) -> RunResult<()> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(ExcType::invalid_radix(radix).into())
    }
}

/// Strips surrounding whitespace and digit-group underscores from a numeral.
///
/// Returns `None` when the body is empty or underscores are leading, trailing or
/// doubled (`1__0`). Digit validity is left to the radix parsers.
pub(crate) fn normalize_numeral(text: &str) -> Option<Cow<'_, str>> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix(&['+', '-'][..]).unwrap_or(trimmed);
    if body.is_empty()
        || body.starts_with(|c: char| c == '_' || c == '+' || c == '-')
        || body.ends_with('_')
        || body.contains("__")
    {
        return None;
    }
    if trimmed.contains('_') {
        Some(Cow::Owned(trimmed.replace('_', "")))
    } else {
        Some(Cow::Borrowed(trimmed))
    }
}

/// Parses a normalized numeral that fits in `i64`.
///
/// `None` covers both malformed digits and out-of-range magnitudes; the caller
/// retries on the Kernel to tell them apart.
pub(crate) fn parse(numeral: &str, radix: u32) -> Option<i64> {
    i64::from_str_radix(numeral, radix).ok()
}

/// Renders `value` in the given radix using lowercase digits.
///
/// The radix must already be validated with [`check_radix`].
pub(crate) fn to_str_radix(value: i64, radix: u32) -> String {
    if radix == 10 {
        return value.to_string();
    }
    let radix = u64::from(radix);
    let mut magnitude = value.unsigned_abs();
    // 64 binary digits plus a sign
    let mut buf = [0u8; 65];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = DIGITS[(magnitude % radix) as usize];
        magnitude /= radix;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        pos -= 1;
        buf[pos] = b'-';
    }
    String::from_utf8_lossy(&buf[pos..]).into_owned()
}
