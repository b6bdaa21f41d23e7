//! Package manifest patching.
//!
//! Each replicated tree gets a package name unique to its store, so that
//! package tooling never confuses two store builds.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::consts::PACKAGE_MANIFEST;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Name change applied to a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedName {
  pub previous: Option<String>,
  pub current: String,
}

/// Compute the store-specific package name.
///
/// A name already carrying the `-<store>` suffix is kept as is, so patching
/// twice gives the same result as patching once.
pub fn store_package_name(original: Option<&str>, store: &str) -> String {
  match original {
    Some(name) if name.ends_with(&format!("-{store}")) => name.to_string(),
    Some(name) if !name.is_empty() => format!("{name}-{store}"),
    _ => store.to_string(),
  }
}

/// Rewrite the `name` field of `<dir>/package.json` for `store`.
///
/// Key order is kept as loaded; output is indented with two spaces.
pub fn patch_manifest(dir: &Path, store: &str) -> Result<PatchedName, ManifestError> {
  let path = dir.join(PACKAGE_MANIFEST);

  let content = fs::read_to_string(&path).map_err(|e| ManifestError::Read {
    path: path.clone(),
    source: e,
  })?;

  let mut manifest: Value = serde_json::from_str(&content).map_err(|e| ManifestError::Parse {
    path: path.clone(),
    message: e.to_string(),
  })?;

  let Some(object) = manifest.as_object_mut() else {
    return Err(ManifestError::Parse {
      path,
      message: "top-level value is not an object".to_string(),
    });
  };

  let previous = object.get("name").and_then(Value::as_str).map(str::to_string);
  let current = store_package_name(previous.as_deref(), store);
  object.insert("name".to_string(), Value::String(current.clone()));

  let rendered = serde_json::to_string_pretty(&manifest).map_err(|e| ManifestError::Parse {
    path: path.clone(),
    message: e.to_string(),
  })?;
  fs::write(&path, rendered).map_err(|e| ManifestError::Write {
    path: path.clone(),
    source: e,
  })?;

  debug!(path = ?path, previous = ?previous, current = %current, "manifest patched");

  Ok(PatchedName { previous, current })
}
