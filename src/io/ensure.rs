use super::filesystem::{FileSystem, OsFs};
use crate::{error::*, stats::Stats, util::ext::*};
use once_cell::sync::Lazy;
use std::{
  collections::HashMap,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Mutex,
  time::{Duration, Instant},
};

static GLOBAL: Lazy<DirCache> = Lazy::new(DirCache::new);

/// Makes sure the directory holding a file exists, remembering recent
/// successes so hot directories are not re-checked on every call.
///
/// The cache is advisory. An entry younger than the caller's freshness window
/// is trusted even if the directory was removed behind our back; once the
/// window passes the filesystem is consulted again.
pub struct DirCache<F = OsFs> {
  fs: F,
  verified: Mutex<HashMap<PathBuf, Instant>>,
  stats: Stats,
}

impl DirCache {
  pub fn new() -> Self {
    Self::with_fs(OsFs)
  }

  /// Process-wide instance, for callers that don't want to carry one around.
  pub fn global() -> &'static DirCache {
    &GLOBAL
  }
}

impl Default for DirCache {
  fn default() -> Self {
    Self::new()
  }
}

impl<F: FileSystem> DirCache<F> {
  pub fn with_fs(fs: F) -> Self {
    Self {
      fs,
      verified: Default::default(),
      stats: Default::default(),
    }
  }

  /// Ensure every directory leading up to `path` exists, so that the file
  /// itself can be created.
  ///
  /// If `fresh_for` is non-zero, a successful check of the same directory
  /// made within the last `fresh_for` is reused. `Duration::ZERO` always hits
  /// the filesystem and leaves the cache untouched.
  ///
  /// Fails with [`Error::InvalidPath`] when `path` has no usable directory and
  /// file name, and with [`Error::DirectoryCreationFailed`] when the
  /// directory could not be created. Neither outcome is cached.
  pub fn ensure_path_to_file<P: AsRef<Path>>(&self, path: P, fresh_for: Duration) -> Result<()> {
    let path = path.as_ref();
    Stats::bump(&self.stats.ensure_calls);

    let dir = directory_portion(path).map_err(|e| {
      Stats::bump(&self.stats.invalid_paths);
      e
    })?;

    let use_cache = fresh_for > Duration::ZERO;
    if use_cache && self.is_fresh(dir, fresh_for) {
      Stats::bump(&self.stats.ensure_averted);
      trace!("`{}' verified recently, skipping check", dir.display());
      return Ok(());
    }

    self.ensure_dir(dir)?;

    if use_cache {
      self.verified.nlock().insert(dir.to_path_buf(), Instant::now());
    }
    Ok(())
  }

  fn is_fresh(&self, dir: &Path, fresh_for: Duration) -> bool {
    self
      .verified
      .nlock()
      .get(dir)
      .map_or(false, |at| at.elapsed() <= fresh_for)
  }

  fn ensure_dir(&self, dir: &Path) -> Result<()> {
    Stats::bump(&self.stats.dir_checks);
    // checking first is much cheaper than create_dir_all on an existing tree
    if self.fs.is_dir(dir) {
      return Ok(());
    }

    debug!("creating directory `{}'", dir.display());
    match self.fs.create_dir_all(dir) {
      Ok(()) => {
        Stats::bump(&self.stats.dirs_created);
        Ok(())
      }
      // somebody else got there first
      Err(e) if e.kind() == ErrorKind::AlreadyExists && self.fs.is_dir(dir) => Ok(()),
      Err(source) => {
        Stats::bump(&self.stats.create_failures);
        warn!("unable to create directory `{}': {}", dir.display(), source);
        Err(Error::DirectoryCreationFailed {
          path: dir.into(),
          source,
        })
      }
    }
  }

  /// True if `dir` has an entry, fresh or not.
  pub fn is_cached<P: AsRef<Path>>(&self, dir: P) -> bool {
    self.verified.nlock().contains_key(dir.as_ref())
  }

  pub fn len(&self) -> usize {
    self.verified.nlock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Forget every verified directory. Only costs extra filesystem checks.
  pub fn clear(&self) {
    self.verified.nlock().clear()
  }

  pub fn stats(&self) -> &Stats {
    &self.stats
  }

  pub fn fs(&self) -> &F {
    &self.fs
  }
}

/// The directory part of `path`, rejecting anything that doesn't name a file
/// inside some directory.
pub fn directory_portion(path: &Path) -> Result<&Path> {
  if path.as_os_str().is_empty() {
    return Err(Error::invalid_path(path, "path is empty"));
  }
  if path.to_string_lossy().contains('\0') {
    return Err(Error::invalid_path(path, "path contains a NUL byte"));
  }
  check_syntax(path)?;
  // `Path::file_name` ignores a trailing `/` or `/.`, which would name the
  // directory itself as the file
  if path.file_name().is_none() || names_a_directory(path) {
    return Err(Error::invalid_path(path, "path has no file name"));
  }
  match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
    _ => Err(Error::invalid_path(path, "path has no directory component")),
  }
}

fn names_a_directory(path: &Path) -> bool {
  let s = path.to_string_lossy();
  let mut rev = s.chars().rev();
  match rev.next() {
    Some(c) if std::path::is_separator(c) => true,
    Some('.') => rev.next().map_or(true, std::path::is_separator),
    _ => false,
  }
}

#[cfg(windows)]
fn check_syntax(path: &Path) -> Result<()> {
  let s = path.to_string_lossy();
  // verbatim and device paths are passed through untouched
  if s.starts_with(r"\\?\") || s.starts_with(r"\\.\") {
    return Ok(());
  }

  let is_sep = |c: char| c == '\\' || c == '/';
  let mut chars = s.chars();
  if let (Some(a), Some(b)) = (chars.next(), chars.next()) {
    if is_sep(a) && is_sep(b) {
      let mut parts = s[2..].split(is_sep);
      let server = parts.next().unwrap_or("");
      let share = parts.next().unwrap_or("");
      if server.is_empty() || share.is_empty() {
        return Err(Error::invalid_path(path, "UNC path needs a server and a share"));
      }
    }
  }

  for (i, c) in s.char_indices() {
    match c {
      ':' if i == 1 && s.as_bytes()[0].is_ascii_alphabetic() => {}
      ':' => return Err(Error::invalid_path(path, "malformed drive specifier")),
      '<' | '>' | '"' | '|' | '?' | '*' => {
        return Err(Error::invalid_path(path, "path contains a reserved character"))
      }
      _ => {}
    }
  }
  Ok(())
}

#[cfg(not(windows))]
fn check_syntax(_: &Path) -> Result<()> {
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{io::filesystem::MockFileSystem, stats::AtomicU64};
  use assert_matches::assert_matches;
  use std::{io, sync::Arc, thread};
  use tempfile::TempDir;

  const WINDOW: Duration = Duration::from_millis(1000);

  fn scratch() -> anyhow::Result<TempDir> {
    let _ = pretty_env_logger::try_init();
    Ok(tempfile::tempdir()?)
  }

  fn get(counter: &AtomicU64) -> u64 {
    Stats::get(counter)
  }

  #[test]
  fn creates_missing_directory() -> anyhow::Result<()> {
    let temp = scratch()?;
    let dir = temp.path().join("a").join("b");
    let cache = DirCache::new();

    assert!(!dir.exists());
    cache.ensure_path_to_file(dir.join("foo.txt"), Duration::ZERO)?;
    assert!(dir.is_dir());
    assert_eq!(get(&cache.stats().dirs_created), 1);
    Ok(())
  }

  #[test]
  fn repeated_calls_succeed() -> anyhow::Result<()> {
    let temp = scratch()?;
    let file = temp.path().join("tempdirB").join("foo.txt");
    let cache = DirCache::new();

    for window in &[Duration::ZERO, WINDOW, Duration::ZERO, WINDOW] {
      cache.ensure_path_to_file(&file, *window)?;
      assert!(temp.path().join("tempdirB").is_dir());
    }
    Ok(())
  }

  #[test]
  fn cache_hit_skips_filesystem() -> anyhow::Result<()> {
    let temp = scratch()?;
    let dir = temp.path().join("tempdirC");
    let file = dir.join("foo.txt");
    let cache = DirCache::new();

    cache.ensure_path_to_file(&file, WINDOW)?;
    for _ in 0..4 {
      cache.ensure_path_to_file(&file, WINDOW)?;
    }

    assert!(dir.is_dir());
    assert!(cache.is_cached(&dir));
    assert_eq!(get(&cache.stats().ensure_calls), 5);
    assert_eq!(get(&cache.stats().dir_checks), 1);
    assert_eq!(get(&cache.stats().ensure_averted), 4);
    Ok(())
  }

  #[test]
  fn cache_hit_makes_no_fs_calls() -> anyhow::Result<()> {
    let mut fs = MockFileSystem::new();
    fs.expect_is_dir().times(1).returning(|_| false);
    fs.expect_create_dir_all().times(1).returning(|_| Ok(()));
    let cache = DirCache::with_fs(fs);

    // any further fs call would exceed the expected counts and panic
    cache.ensure_path_to_file("/data/in/one.csv", WINDOW)?;
    cache.ensure_path_to_file("/data/in/two.csv", WINDOW)?;
    cache.ensure_path_to_file("/data/in/three.csv", WINDOW)?;
    assert_eq!(get(&cache.stats().ensure_averted), 2);
    Ok(())
  }

  #[test]
  fn entries_expire() -> anyhow::Result<()> {
    let temp = scratch()?;
    let file = temp.path().join("expiring").join("foo.txt");
    let cache = DirCache::new();
    let window = Duration::from_millis(200);

    cache.ensure_path_to_file(&file, window)?;
    cache.ensure_path_to_file(&file, window)?;
    assert_eq!(get(&cache.stats().dir_checks), 1);

    thread::sleep(Duration::from_millis(300));
    cache.ensure_path_to_file(&file, window)?;
    assert_eq!(get(&cache.stats().dir_checks), 2);

    cache.ensure_path_to_file(&file, window)?;
    assert_eq!(get(&cache.stats().dir_checks), 2);
    Ok(())
  }

  #[test]
  fn zero_window_never_caches() -> anyhow::Result<()> {
    let temp = scratch()?;
    let file = temp.path().join("uncached").join("foo.txt");
    let cache = DirCache::new();

    for _ in 0..5 {
      cache.ensure_path_to_file(&file, Duration::ZERO)?;
    }
    assert_eq!(get(&cache.stats().dir_checks), 5);
    assert_eq!(get(&cache.stats().ensure_averted), 0);
    assert!(cache.is_empty());
    Ok(())
  }

  #[test]
  fn zero_window_ignores_fresh_entry() -> anyhow::Result<()> {
    let temp = scratch()?;
    let file = temp.path().join("mixed").join("foo.txt");
    let cache = DirCache::new();

    cache.ensure_path_to_file(&file, WINDOW)?;
    cache.ensure_path_to_file(&file, Duration::ZERO)?;
    assert_eq!(get(&cache.stats().dir_checks), 2);
    Ok(())
  }

  #[test]
  fn rejects_invalid_paths() {
    // no expectations: touching the filesystem panics
    let cache = DirCache::with_fs(MockFileSystem::new());
    let bad = [
      "",
      "foo.txt",
      "/",
      ".",
      "..",
      "dir/..",
      "dir/",
      "dir/.",
      "foo\0bar/baz.txt",
    ];

    for p in &bad {
      for window in &[Duration::ZERO, WINDOW] {
        assert_matches!(
          cache.ensure_path_to_file(p, *window),
          Err(Error::InvalidPath { .. })
        );
      }
    }
    assert!(cache.is_empty());
    assert_eq!(get(&cache.stats().invalid_paths), bad.len() as u64 * 2);
  }

  #[cfg(not(windows))]
  #[test]
  fn colon_without_directory_is_invalid() {
    let cache = DirCache::with_fs(MockFileSystem::new());
    assert_matches!(
      cache.ensure_path_to_file("fdsAF:DSAFDsafd", WINDOW),
      Err(Error::InvalidPath { .. })
    );
  }

  #[cfg(windows)]
  #[test]
  fn rejects_malformed_windows_paths() {
    let cache = DirCache::with_fs(MockFileSystem::new());
    for p in &[
      "fdsAF:DSAFDsafd",
      r"c:\dir\fo:o.txt",
      r"\\test_unc_path_style_server",
      r"c:\dir\f?o.txt",
    ] {
      assert_matches!(
        cache.ensure_path_to_file(p, WINDOW),
        Err(Error::InvalidPath { .. })
      );
    }
  }

  #[test]
  fn directory_portion_strips_file_name() {
    assert_eq!(
      directory_portion(Path::new("/var/log/app.log")).unwrap(),
      Path::new("/var/log")
    );
    assert_eq!(
      directory_portion(Path::new("rel/app.log")).unwrap(),
      Path::new("rel")
    );
    assert_eq!(directory_portion(Path::new("/app.log")).unwrap(), Path::new("/"));
    assert_eq!(
      directory_portion(Path::new("logs/app.")).unwrap(),
      Path::new("logs")
    );
    assert_eq!(
      directory_portion(Path::new("logs/.hidden")).unwrap(),
      Path::new("logs")
    );
  }

  #[test]
  fn trailing_separator_or_dot_is_invalid() -> anyhow::Result<()> {
    let temp = scratch()?;
    let dir = temp.path().join("a").join("b");
    let cache = DirCache::new();

    for p in &[
      format!("{}/", dir.display()),
      format!("{}/.", dir.display()),
      format!("{}//", dir.display()),
    ] {
      assert_matches!(
        cache.ensure_path_to_file(p, Duration::ZERO),
        Err(Error::InvalidPath { .. })
      );
      assert_matches!(
        directory_portion(Path::new(p)),
        Err(Error::InvalidPath { .. })
      );
    }
    // nothing was created on the way to the error
    assert!(!temp.path().join("a").exists());
    assert!(cache.is_empty());
    Ok(())
  }

  #[test]
  fn creation_failure_is_reported_and_not_cached() -> anyhow::Result<()> {
    let temp = scratch()?;
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory")?;
    let file = blocker.join("sub").join("foo.txt");
    let cache = DirCache::new();

    for _ in 0..2 {
      assert_matches!(
        cache.ensure_path_to_file(&file, WINDOW),
        Err(Error::DirectoryCreationFailed { path, .. }) if path == blocker.join("sub")
      );
    }
    assert!(cache.is_empty());
    assert_eq!(get(&cache.stats().create_failures), 2);
    Ok(())
  }

  #[test]
  fn failure_carries_source() {
    let mut fs = MockFileSystem::new();
    fs.expect_is_dir().returning(|_| false);
    fs.expect_create_dir_all()
      .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
    let cache = DirCache::with_fs(fs);

    match cache.ensure_path_to_file("/locked/foo.txt", WINDOW) {
      Err(Error::DirectoryCreationFailed { source, .. }) => {
        assert_eq!(source.kind(), io::ErrorKind::PermissionDenied)
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn lost_creation_race_is_success() -> anyhow::Result<()> {
    let mut checks = 0;
    let mut fs = MockFileSystem::new();
    fs.expect_is_dir().times(2).returning(move |_| {
      checks += 1;
      checks > 1
    });
    fs.expect_create_dir_all()
      .times(1)
      .returning(|_| Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists")));
    let cache = DirCache::with_fs(fs);

    cache.ensure_path_to_file("/race/foo.txt", WINDOW)?;
    assert!(cache.is_cached("/race"));
    Ok(())
  }

  #[test]
  fn deleted_directory_trusted_until_expiry() -> anyhow::Result<()> {
    let temp = scratch()?;
    let dir = temp.path().join("vanishing");
    let file = dir.join("foo.txt");
    let cache = DirCache::new();

    cache.ensure_path_to_file(&file, WINDOW)?;
    std::fs::remove_dir(&dir)?;
    cache.ensure_path_to_file(&file, WINDOW)?;
    assert!(!dir.exists());

    cache.clear();
    cache.ensure_path_to_file(&file, WINDOW)?;
    assert!(dir.is_dir());
    Ok(())
  }

  #[test]
  fn concurrent_callers() -> anyhow::Result<()> {
    let temp = scratch()?;
    let dir = temp.path().join("shared").join("deep").join("dir");
    let cache = Arc::new(DirCache::new());

    let handles: Vec<_> = (0..16)
      .map(|i| {
        let cache = cache.clone();
        let file = dir.join(format!("file{}.txt", i));
        thread::spawn(move || -> Result<()> {
          for _ in 0..25 {
            cache.ensure_path_to_file(&file, WINDOW)?;
          }
          Ok(())
        })
      })
      .collect();

    for h in handles {
      h.join().expect("worker panicked")?;
    }

    assert!(dir.is_dir());
    assert_eq!(cache.len(), 1);
    assert!(cache.is_cached(&dir));
    assert_eq!(get(&cache.stats().ensure_calls), 16 * 25);
    Ok(())
  }
}
