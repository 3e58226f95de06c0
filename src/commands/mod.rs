// castdeck Commands
// Console actions over the application state

pub mod server;
pub mod settings;
pub mod stream;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Critical,
}

/// What a command reports back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, message)
    }

    pub fn critical(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Critical, title, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Critical => "error",
        };
        write!(f, "[{tag}] {}: {}", self.title, self.message)
    }
}

pub const HELP: &str = "\
Stream
  start              start BUTT with the current settings
  stop               stop BUTT and wait for it to exit
  status             stream state and live statistics
  stats              refresh live statistics now
Server
  test               test the connection to Icecast
  mount              check whether the mountpoint is active
  meta               push title/description/genre to the mount
  admin              check that the admin page answers
  open-admin         open the admin page in the browser
  open-url           open the stream URL in the browser
Settings
  show               show the current settings
  set <key> <value>  change a setting (not saved until 'save')
  save / load        write / read the settings file
  api                check the local settings API
  open-settings      open the settings API URL in the browser
  help / quit";

/// Split an input line into the command word and the rest
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (line, ""),
    }
}

/// Split `set` arguments into key and value
///
/// The value is everything after the first space following the key, so
/// passwords keep their inner and trailing whitespace.
pub fn split_set_args(args: &str) -> (&str, &str) {
    match args.split_once(' ') {
        Some((key, value)) => (key, value),
        None => (args.trim_end(), ""),
    }
}
