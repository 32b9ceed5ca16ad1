use once_cell::sync::OnceCell;

static MACHINE_NAME: OnceCell<Option<String>> = OnceCell::new();

/// Name of this machine. The lookup happens once per process; `default` is
/// used whenever it came back empty.
pub fn machine_name(default: &str) -> String {
  MACHINE_NAME
    .get_or_init(fetch_machine_name)
    .clone()
    .unwrap_or_else(|| default.to_owned())
}

/// Ask the OS for the machine name, uncached. `None` if it refuses or the
/// name is blank.
#[cfg(unix)]
pub fn fetch_machine_name() -> Option<String> {
  let mut buf = [0u8; 256];
  match nix::unistd::gethostname(&mut buf) {
    Ok(name) => non_blank(&name.to_string_lossy()),
    Err(e) => {
      warn!("gethostname failed: {}", e);
      None
    }
  }
}

#[cfg(windows)]
pub fn fetch_machine_name() -> Option<String> {
  std::env::var("COMPUTERNAME")
    .ok()
    .and_then(|n| non_blank(&n))
}

#[cfg(not(any(unix, windows)))]
pub fn fetch_machine_name() -> Option<String> {
  None
}

fn non_blank(name: &str) -> Option<String> {
  let name = name.trim();
  if name.is_empty() {
    None
  } else {
    Some(name.to_owned())
  }
}
