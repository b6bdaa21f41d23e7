//! CLI output formatting utilities.
//!
//! Colored status lines and durations for the summary printed on stdout.
//! Logs go to stderr through tracing, so stdout stays readable or parseable.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

/// Kind of status line, which picks the symbol and its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
  Success,
  Failure,
  Info,
}

impl Status {
  fn symbol(self) -> String {
    match self {
      Status::Success => symbols::SUCCESS
        .if_supports_color(Stream::Stdout, |s| s.green())
        .to_string(),
      Status::Failure => symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
      Status::Info => symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()).to_string(),
    }
  }
}

fn print_status(status: Status, message: &str) {
  match status {
    Status::Failure => println!(
      "{} {}",
      status.symbol(),
      message.if_supports_color(Stream::Stdout, |s| s.red())
    ),
    _ => println!("{} {}", status.symbol(), message),
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  match secs {
    60.. => format!("{}m {}s", secs / 60, secs % 60),
    1.. => format!("{}.{:02}s", secs, millis / 10),
    0 => format!("{}ms", millis),
  }
}

pub fn print_success(message: &str) {
  print_status(Status::Success, message);
}

/// Store-level failure. Goes to stdout with the rest of the summary.
pub fn print_failure(message: &str) {
  print_status(Status::Failure, message);
}

pub fn print_info(message: &str) {
  print_status(Status::Info, message);
}

/// Operator-facing caveat, kept off stdout.
pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
  println!("{json}");
  Ok(())
}
