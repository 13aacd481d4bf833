//! Normalization of untrusted numeric input.
//!
//! Query parameters are never rejected: anything unparsable falls back to
//! the default and anything out of range is clamped into `[min, max]`.

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// A closed `[min, max]` range with a fallback used for unparsable input.
///
/// The fallback is clamped as well, so [`BoundsSpec::validate`] always
/// returns a value inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsSpec {
    /// Value used when the input is missing or not numeric.
    pub default: i64,
    /// Inclusive lower bound.
    pub min: i64,
    /// Inclusive upper bound.
    pub max: i64,
}

impl BoundsSpec {
    /// Creates a bounds specification.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if `min > max`.
    pub fn new(default: i64, min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(ProbeError::Config {
                message: format!("bounds minimum {min} exceeds maximum {max}"),
            });
        }
        Ok(Self { default, min, max })
    }

    /// Normalizes a raw, untrusted value into the range.
    pub fn validate(&self, raw: Option<&str>) -> i64 {
        validate(raw, self.default, self.min, self.max)
    }

    /// Same as [`Self::validate`], returned as an unsigned count.
    ///
    /// Negative results collapse to zero; with `min >= 0` that never
    /// happens.
    pub fn validate_count(&self, raw: Option<&str>) -> u64 {
        u64::try_from(self.validate(raw)).unwrap_or(0)
    }
}

/// Parses `raw` as a base-10 integer and clamps it into `[min, max]`.
///
/// Parsing follows the lenient prefix rules web clients expect: leading
/// whitespace and a sign are accepted, and trailing garbage after the
/// digits is ignored (`"42abc"` is 42, `"3.9"` is 3). Inputs with no
/// leading digits fall back to `default`, which is itself clamped.
/// Values too large for `i64` saturate before clamping.
pub fn validate(raw: Option<&str>, default: i64, min: i64, max: i64) -> i64 {
    let value = raw.and_then(parse_leading_int).unwrap_or(default);
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for digit in rest[..digits_len].bytes() {
        let d = i64::from(digit - b'0');
        value = match value.checked_mul(10).and_then(|v| {
            if negative {
                v.checked_sub(d)
            } else {
                v.checked_add(d)
            }
        }) {
            Some(v) => v,
            None if negative => return Some(i64::MIN),
            None => return Some(i64::MAX),
        };
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_inside_range_is_returned() {
        assert_eq!(validate(Some("5"), 10, 1, 100), 5);
    }

    #[test]
    fn value_below_min_is_clamped() {
        assert_eq!(validate(Some("0"), 100, 1, 10_000), 1);
        assert_eq!(validate(Some("-20"), 100, 1, 10_000), 1);
    }

    #[test]
    fn value_above_max_is_clamped() {
        assert_eq!(validate(Some("999999999"), 100, 1, 512), 512);
    }

    #[test]
    fn missing_input_returns_default() {
        assert_eq!(validate(None, 100, 1, 512), 100);
    }

    #[test]
    fn non_numeric_input_returns_default() {
        assert_eq!(validate(Some("abc"), 42, 1, 100), 42);
        assert_eq!(validate(Some(""), 42, 1, 100), 42);
        assert_eq!(validate(Some("-"), 42, 1, 100), 42);
    }

    #[test]
    fn trailing_garbage_is_ignored() {
        assert_eq!(validate(Some("42abc"), 1, 1, 100), 42);
        assert_eq!(validate(Some("3.9"), 1, 1, 100), 3);
        assert_eq!(validate(Some("  7"), 1, 1, 100), 7);
        assert_eq!(validate(Some("+8"), 1, 1, 100), 8);
    }

    #[test]
    fn out_of_range_default_is_clamped() {
        assert_eq!(validate(Some("nope"), 1_000_000, 1, 100), 100);
        assert_eq!(validate(None, -3, 1, 100), 1);
    }

    #[test]
    fn overflowing_input_saturates_then_clamps() {
        assert_eq!(validate(Some("99999999999999999999999999"), 1, 1, 512), 512);
        assert_eq!(validate(Some("-99999999999999999999999999"), 1, 1, 512), 1);
    }

    #[test]
    fn result_always_within_bounds() {
        let inputs = ["-1", "0", "1", "50", "100", "101", "x", "1e9", "  -0"];
        for default in [1, 50, 100] {
            for raw in inputs {
                let v = validate(Some(raw), default, 1, 100);
                assert!((1..=100).contains(&v), "{raw} -> {v}");
            }
        }
    }

    #[test]
    fn bounds_spec_rejects_inverted_range() {
        assert!(BoundsSpec::new(1, 10, 5).is_err());
    }

    #[test]
    fn bounds_spec_validate_count() {
        let spec = BoundsSpec::new(100, 1, 10_000).unwrap();
        assert_eq!(spec.validate_count(Some("0")), 1);
        assert_eq!(spec.validate_count(Some("250")), 250);
        assert_eq!(spec.validate_count(None), 100);
    }
}
