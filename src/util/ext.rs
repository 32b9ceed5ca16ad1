use crate::error::*;
use std::{
  path::Path,
  sync::{Mutex, MutexGuard, PoisonError},
};

pub trait MutexExt<T> {
  /// Lock, recovering the guard if a previous holder panicked.
  fn nlock(&self) -> MutexGuard<T>;
}

impl<T> MutexExt<T> for Mutex<T> {
  fn nlock(&self) -> MutexGuard<T> {
    self.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

pub trait IoResultExt<T> {
  fn on_path<P: AsRef<Path>>(self, path: P) -> Result<T>;
  fn no_path(self) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
  fn on_path<P: AsRef<Path>>(self, path: P) -> Result<T> {
    self.map_err(|io| Error::Io {
      error: io,
      path: Some(path.as_ref().into()),
    })
  }

  fn no_path(self) -> Result<T> {
    self.map_err(|io| Error::Io {
      error: io,
      path: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_matches::assert_matches;
  use std::{io, sync::Arc, thread};

  #[test]
  fn nlock_survives_poison() {
    let m = Arc::new(Mutex::new(1));
    let m2 = m.clone();
    let _ = thread::spawn(move || {
      let _guard = m2.lock().unwrap();
      panic!("poison the lock");
    })
    .join();
    assert!(m.is_poisoned());
    *m.nlock() += 1;
    assert_eq!(*m.nlock(), 2);
  }

  #[test]
  fn on_path_attaches_path() {
    let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
    assert_matches!(
      res.on_path("/tmp/x"),
      Err(Error::Io { path: Some(p), .. }) if p == Path::new("/tmp/x")
    );
  }
}
