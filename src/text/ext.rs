use std::fmt::{self, Write};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

pub trait StringExt {
  fn append_line(&mut self, line: &str);

  /// Append formatted text and a line ending. Use with `format_args!`.
  fn append_line_fmt(&mut self, args: fmt::Arguments) -> fmt::Result;
}

impl StringExt for String {
  fn append_line(&mut self, line: &str) {
    self.push_str(line);
    self.push_str(LINE_ENDING);
  }

  fn append_line_fmt(&mut self, args: fmt::Arguments) -> fmt::Result {
    self.write_fmt(args)?;
    self.push_str(LINE_ENDING);
    Ok(())
  }
}
