//! Small string helpers that never fail on missing input.

use std::fmt::{self, Display, Write as _};

pub mod ext;

/// Format like `format!`, then trim. A blank result is `""`.
#[macro_export]
macro_rules! format_safe {
  ($($arg:tt)*) => {
    $crate::text::trim_safe(Some(format!($($arg)*).as_str()))
  };
}

/// True for `None` and for strings that are empty or only whitespace.
pub fn is_blank<S: AsRef<str>>(value: Option<S>) -> bool {
  value.map_or(true, |s| s.as_ref().trim().is_empty())
}

/// Right-pad `value` with `pad` until it is at least `places` chars long.
///
/// `postpend(Some("BALL"), 7, '8')` is `"BALL888"`.
pub fn postpend(value: Option<&str>, places: usize, pad: char) -> String {
  let mut out = value.unwrap_or_default().to_owned();
  let len = out.chars().count();
  out.extend(std::iter::repeat(pad).take(places.saturating_sub(len)));
  out
}

/// Like [`postpend`], but appends whole copies of `pad`, so the result can be
/// longer than `places`: `postpend_str(Some("BALL"), 7, "88")` is
/// `"BALL8888"`. An empty `pad` leaves the value alone.
pub fn postpend_str(value: Option<&str>, places: usize, pad: &str) -> String {
  let mut out = value.unwrap_or_default().to_owned();
  let step = pad.chars().count();
  if step == 0 {
    return out;
  }
  let mut len = out.chars().count();
  while len < places {
    out.push_str(pad);
    len += step;
  }
  out
}

pub fn trim_safe(value: Option<&str>) -> String {
  value.map(str::trim).unwrap_or_default().to_owned()
}

/// Render `value` with its `Display` impl. `None` gives `if_none`; an impl
/// that reports an error gives `if_corrupt`.
pub fn to_string_safe<T: Display + ?Sized>(
  value: Option<&T>,
  if_none: &str,
  if_corrupt: &str,
) -> String {
  let value = match value {
    Some(v) => v,
    None => return if_none.to_owned(),
  };
  let mut out = String::new();
  match write!(out, "{}", value) {
    Ok(()) => out,
    Err(fmt::Error) => {
      debug!("Display impl failed, using fallback {:?}", if_corrupt);
      if_corrupt.to_owned()
    }
  }
}
