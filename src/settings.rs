use crate::error::*;
use std::time::Duration;

const DEFAULT_MACHINE_NAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  ensure_cache_window: Duration,
  machine_name_default: String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      ensure_cache_window: Duration::ZERO,
      machine_name_default: DEFAULT_MACHINE_NAME.into(),
    }
  }
}

impl Settings {
  pub fn get() -> Result<Self> {
    Self::from_lookup(|var| std::env::var(var).ok())
  }

  fn from_lookup<F: Fn(&'static str) -> Option<String>>(lookup: F) -> Result<Self> {
    let mut s = Self::default();
    if let Some(ms) = lookup("MURRAY_ENSURE_CACHE_MS") {
      let ms = ms
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::InvalidSetting {
          var: "MURRAY_ENSURE_CACHE_MS",
          value: ms.clone(),
        })?;
      s.ensure_cache_window = Duration::from_millis(ms);
    }
    if let Some(name) = lookup("MURRAY_MACHINE_NAME_DEFAULT") {
      s.machine_name_default = name;
    }
    Ok(s)
  }

  pub fn with_ensure_cache_window(mut self, window: Duration) -> Self {
    self.ensure_cache_window = window;
    self
  }

  pub fn with_machine_name_default<S: Into<String>>(mut self, name: S) -> Self {
    self.machine_name_default = name.into();
    self
  }

  /// May be overridden using `MURRAY_ENSURE_CACHE_MS`. Zero disables the cache.
  pub fn ensure_cache_window(&self) -> Duration {
    self.ensure_cache_window
  }

  /// May be overridden using `MURRAY_MACHINE_NAME_DEFAULT`.
  pub fn machine_name_default(&self) -> &str {
    &self.machine_name_default
  }
}
