use std::{fs, io, path::Path};

/// The two filesystem primitives a [`DirCache`](super::DirCache) relies on.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
  fn is_dir(&self, path: &Path) -> bool;
  fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FileSystem for OsFs {
  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }
}
