//! Path and file I/O helpers.

use crate::{error::*, util::ext::*};
use std::{
  fs::{self, File},
  io::{Read, Write},
  path::{Path, PathBuf},
  time::Duration,
};

mod ensure;
pub mod filesystem;

pub use ensure::{directory_portion, DirCache};

/// [`DirCache::ensure_path_to_file`] on the process-wide cache.
pub fn ensure_path_to_file<P: AsRef<Path>>(path: P, fresh_for: Duration) -> Result<()> {
  DirCache::global().ensure_path_to_file(path, fresh_for)
}

/// Create or truncate `path` and write `text` to it. The parent directory
/// must already exist.
pub fn write_text_file<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
  let path = path.as_ref();
  let mut f = File::create(path).on_path(path)?;
  f.write_all(text.as_bytes()).on_path(path)?;
  f.flush().on_path(path)
}

/// Read a whole file as ASCII. Bytes outside the ASCII range come back as `?`.
pub fn read_ascii_text_file<P: AsRef<Path>>(path: P) -> Result<String> {
  let path = path.as_ref();
  let bytes = fs::read(path).on_path(path)?;
  Ok(
    bytes
      .into_iter()
      .map(|b| if b.is_ascii() { b as char } else { '?' })
      .collect(),
  )
}

pub fn read_full_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  reader.read_to_end(&mut buf).no_path()?;
  Ok(buf)
}

/// Directory holding the running executable, if it can be determined.
pub fn executable_dir() -> Option<PathBuf> {
  match std::env::current_exe() {
    Ok(exe) => exe.parent().map(Path::to_path_buf),
    Err(e) => {
      debug!("unable to locate current executable: {}", e);
      None
    }
  }
}

/// [`executable_dir`], or the temp directory when that fails. Never empty.
pub fn current_dir() -> PathBuf {
  executable_dir()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(std::env::temp_dir)
}
