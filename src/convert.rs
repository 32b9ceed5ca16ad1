//! Lenient coercion from user-supplied strings.
//!
//! Every `to_*` function documents the value it falls back to; the `parse_*`
//! functions report why a value was rejected instead.

use crate::error::*;
use lazy_static::lazy_static;
use std::{collections::HashSet, convert::TryFrom};

lazy_static! {
  static ref TRUTHY: HashSet<&'static str> = [
    "1", "T", "Y", "TRUE", "YES", "YEP", "YEA", "YEAH", "ON", "FOSHO"
  ]
  .iter()
  .copied()
  .collect();
}

/// Interpret T/F, Y/N, ON/OFF style flags, ignoring case and surrounding
/// whitespace. Blank input gives `if_empty`; anything not recognised as
/// truthy is `false`.
pub fn to_bool(value: Option<&str>, if_empty: bool) -> bool {
  let s = value.unwrap_or_default().trim().to_uppercase();
  if s.is_empty() {
    return if_empty;
  }
  TRUTHY.contains(s.as_str())
}

/// Parse an integer, accepting thousands separators (`1,000,000`) and
/// decimals, which are rounded half to even.
pub fn parse_i64(value: &str) -> Result<i64> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Blank);
  }
  let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
  if let Ok(n) = cleaned.parse::<i64>() {
    return Ok(n);
  }
  match cleaned.parse::<f64>() {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    Ok(f) if f.is_finite() => {
      let r = f.round_ties_even();
      if r >= i64::MIN as f64 && r < i64::MAX as f64 {
        Ok(r as i64)
      } else {
        Err(Error::NotANumber(value.into()))
      }
    }
    _ => Err(Error::NotANumber(value.into())),
  }
}

/// [`parse_i64`], falling back to `if_empty` for `None` or blank input and to
/// `if_corrupt` for anything unparseable.
pub fn to_int64(value: Option<&str>, if_empty: i64, if_corrupt: i64) -> i64 {
  match value.map(parse_i64) {
    None | Some(Err(Error::Blank)) => if_empty,
    Some(Ok(n)) => n,
    Some(Err(e)) => {
      trace!("{}, using {}", e, if_corrupt);
      if_corrupt
    }
  }
}

/// [`to_int64`], saturating at the bounds of `i32`.
pub fn to_int(value: Option<&str>, if_empty: i32, if_corrupt: i32) -> i32 {
  let n = to_int64(value, if_empty.into(), if_corrupt.into());
  i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
}
