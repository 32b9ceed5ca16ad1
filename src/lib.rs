//! Shared helpers: path and file I/O, string padding and coercion, and
//! machine lookup.
//!
//! The centrepiece is [`DirCache`], which makes sure a file's directory
//! exists and can skip the filesystem for directories it verified recently.

#[macro_use]
extern crate log;

pub mod convert;
pub mod error;
pub mod host;
pub mod io;
pub mod settings;
pub mod stats;
pub mod text;
mod util;

pub use error::{Error, Result};
pub use io::DirCache;
pub use settings::Settings;
pub use text::ext::StringExt;

use std::path::Path;

/// A [`DirCache`] paired with the [`Settings`] that drive it.
pub struct Common {
  dirs: DirCache,
  settings: Settings,
}

impl Common {
  pub fn new() -> Result<Self> {
    Ok(Self::with_settings(Settings::get()?))
  }

  pub fn with_settings(settings: Settings) -> Self {
    Self {
      dirs: DirCache::new(),
      settings,
    }
  }

  /// Ensure the directory for `path` exists, reusing results for the
  /// configured cache window.
  pub fn ensure_path_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    self
      .dirs
      .ensure_path_to_file(path, self.settings.ensure_cache_window())
  }

  pub fn machine_name(&self) -> String {
    host::machine_name(self.settings.machine_name_default())
  }

  pub fn dir_cache(&self) -> &DirCache {
    &self.dirs
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn stats(&self) -> &stats::Stats {
    self.dirs.stats()
  }
}

#[test]
fn test_configured_window() -> anyhow::Result<()> {
  let temp = tempfile::tempdir()?;
  let file = temp.path().join("logs").join("today.log");
  let common = Common::with_settings(
    Settings::default().with_ensure_cache_window(std::time::Duration::from_secs(10)),
  );

  common.ensure_path_to_file(&file)?;
  common.ensure_path_to_file(&file)?;
  assert!(temp.path().join("logs").is_dir());
  assert_eq!(stats::Stats::get(&common.stats().ensure_averted), 1);
  Ok(())
}

#[test]
fn test_default_settings_disable_cache() -> anyhow::Result<()> {
  let temp = tempfile::tempdir()?;
  let file = temp.path().join("out.txt");
  let common = Common::with_settings(Settings::default());

  common.ensure_path_to_file(&file)?;
  common.ensure_path_to_file(&file)?;
  assert!(common.dir_cache().is_empty());
  assert_eq!(stats::Stats::get(&common.stats().dir_checks), 2);
  assert!(!common.machine_name().is_empty());
  Ok(())
}

#[test]
fn test_new_from_env() -> anyhow::Result<()> {
  std::env::remove_var("MURRAY_ENSURE_CACHE_MS");
  std::env::remove_var("MURRAY_MACHINE_NAME_DEFAULT");
  let common = Common::new()?;
  assert_eq!(common.settings(), &Settings::default());

  let temp = tempfile::tempdir()?;
  let dir = temp.path().join("from_env");
  common.ensure_path_to_file(dir.join("x.log"))?;
  assert!(dir.is_dir());
  assert!(common.dir_cache().is_empty());
  Ok(())
}
