use std::{io, path::PathBuf, result};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  // path parsing errors
  #[error("invalid path `{}': {reason}", path.display())]
  InvalidPath { path: PathBuf, reason: &'static str },

  // IO stuff
  #[error("unable to create directory `{}': {source}", path.display())]
  DirectoryCreationFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("I/O error{}: {error}", at(path))]
  Io {
    #[source]
    error: io::Error,
    path: Option<PathBuf>,
  },

  // coercion
  #[error("not a number: {0:?}")]
  NotANumber(String),
  #[error("blank input")]
  Blank,

  // settings
  #[error("invalid value {value:?} for setting `{var}'")]
  InvalidSetting { var: &'static str, value: String },
}

impl Error {
  pub(crate) fn invalid_path<P: Into<PathBuf>>(path: P, reason: &'static str) -> Self {
    Self::InvalidPath {
      path: path.into(),
      reason,
    }
  }
}

fn at(path: &Option<PathBuf>) -> String {
  match path {
    Some(p) => format!(" at `{}'", p.display()),
    None => String::new(),
  }
}

pub type Result<T> = result::Result<T, Error>;
