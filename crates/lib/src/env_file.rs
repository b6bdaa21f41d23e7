//! Store environment file.
//!
//! The format is plain `KEY=VALUE` lines joined by `\n`, without quoting or a
//! trailing newline. Values are written untouched, so a value holding a
//! newline produces extra lines.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use crate::consts::ENV_FILE_NAME;

#[derive(Debug, Error)]
pub enum EnvFileError {
  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Render variables as `KEY=VALUE` lines in insertion order.
pub fn render_env(vars: &IndexMap<String, String>) -> String {
  vars
    .iter()
    .map(|(key, value)| format!("{key}={value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Parse `KEY=VALUE` lines. Lines without `=` are ignored.
pub fn parse_env(content: &str) -> IndexMap<String, String> {
  content
    .lines()
    .filter_map(|line| line.split_once('='))
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Write the environment file at the root of `dir`, replacing any existing one.
pub fn write_env_file(dir: &Path, vars: &IndexMap<String, String>) -> Result<PathBuf, EnvFileError> {
  for (key, value) in vars {
    if value.contains('\n') || value.contains('\r') {
      warn!(key = %key, "value contains a line break, environment file will not round-trip");
    }
  }

  let path = dir.join(ENV_FILE_NAME);
  fs::write(&path, render_env(vars)).map_err(|e| EnvFileError::Write {
    path: path.clone(),
    source: e,
  })?;
  Ok(path)
}

/// Read back the environment file of a tree.
pub fn read_env_file(dir: &Path) -> Result<IndexMap<String, String>, EnvFileError> {
  let path = dir.join(ENV_FILE_NAME);
  let content = fs::read_to_string(&path).map_err(|e| EnvFileError::Read { path, source: e })?;
  Ok(parse_env(&content))
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn renders_in_insertion_order() {
    let vars = vars(&[("NEXT_PUBLIC_STORE_ID", "nike"), ("NEXT_PUBLIC_CURRENCY", "USD")]);
    assert_eq!(render_env(&vars), "NEXT_PUBLIC_STORE_ID=nike\nNEXT_PUBLIC_CURRENCY=USD");
  }

  #[test]
  fn empty_config_renders_empty_file() {
    assert_eq!(render_env(&IndexMap::new()), "");
    assert!(parse_env("").is_empty());
  }

  #[test]
  fn values_are_not_quoted() {
    let vars = vars(&[("THEME", "#FF6900"), ("URL", "https://api.nike.com?a=b")]);
    let rendered = render_env(&vars);

    assert_eq!(rendered, "THEME=#FF6900\nURL=https://api.nike.com?a=b");
    assert_eq!(parse_env(&rendered), vars);
  }

  #[test]
  fn write_then_read_round_trips() {
    let dir = TempDir::new().unwrap();
    let vars = vars(&[
      ("NEXT_PUBLIC_STORE_NAME", "Adidas Official Store"),
      ("EMPTY", ""),
      ("NEXT_PUBLIC_COUNTRY", "DE"),
    ]);

    let path = write_env_file(dir.path(), &vars).unwrap();

    assert!(path.ends_with(ENV_FILE_NAME));
    assert_eq!(read_env_file(dir.path()).unwrap(), vars);
  }

  #[test]
  fn overwrites_existing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(ENV_FILE_NAME), "OLD=1\nSTALE=2").unwrap();

    write_env_file(dir.path(), &vars(&[("NEW", "3")])).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join(ENV_FILE_NAME)).unwrap(), "NEW=3");
  }

  proptest! {
    #[test]
    fn single_line_values_round_trip(
      pairs in proptest::collection::vec(("[A-Z_][A-Z0-9_]{0,12}", "[^\r\n]{0,24}"), 0..8)
    ) {
      let vars: IndexMap<String, String> = pairs.into_iter().collect();

      let rendered = render_env(&vars);

      prop_assert!(!rendered.ends_with('\n'));
      prop_assert_eq!(rendered.lines().count(), vars.len());
      prop_assert_eq!(parse_env(&rendered), vars);
    }
  }

  #[traced_test]
  #[test]
  fn warns_on_multiline_value() {
    let dir = TempDir::new().unwrap();
    write_env_file(dir.path(), &vars(&[("BANNER", "line one\nline two")])).unwrap();

    assert!(logs_contain("line break"));
  }
}
