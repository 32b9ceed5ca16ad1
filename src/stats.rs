pub use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`DirCache`](crate::io::DirCache).
#[derive(Debug, Default)]
pub struct Stats {
  pub ensure_calls: AtomicU64,
  /// Calls answered from the cache without touching the filesystem.
  pub ensure_averted: AtomicU64,
  pub dir_checks: AtomicU64,
  pub dirs_created: AtomicU64,
  pub invalid_paths: AtomicU64,
  pub create_failures: AtomicU64,
}

impl Stats {
  pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::SeqCst);
  }

  pub fn get(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::SeqCst)
  }
}
