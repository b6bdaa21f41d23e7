//! Store definitions.
//!
//! A store is one storefront instance that gets its own replicated tree,
//! environment file and build output under the output root.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::api::ApiConfig;

/// Errors found while validating a batch of stores.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreNameError {
  #[error("store name must not be empty")]
  Empty,

  #[error("store name '{0}' is not a single path segment")]
  NotASegment(String),

  #[error("store name '{0}' is used more than once")]
  Duplicate(String),
}

/// One store in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSpec {
  /// Directory name under the output root and suffix for the package name.
  pub name: String,

  /// Variables written to the store's environment file, in order.
  #[serde(default)]
  pub config: IndexMap<String, String>,

  /// Per-store data API settings, overriding the batch-wide ones.
  #[serde(default)]
  pub api: Option<ApiConfig>,
}

impl StoreSpec {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      config: IndexMap::new(),
      api: None,
    }
  }

  /// Add a variable, keeping insertion order.
  pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.config.insert(key.into(), value.into());
    self
  }
}

/// Check that a store name can be used as one directory name.
pub fn validate_store_name(name: &str) -> Result<(), StoreNameError> {
  if name.is_empty() {
    return Err(StoreNameError::Empty);
  }

  let bad = name == "."
    || name == ".."
    || name.contains('/')
    || name.contains('\\')
    || name.contains('\0')
    || name.trim() != name;

  if bad {
    return Err(StoreNameError::NotASegment(name.to_string()));
  }

  Ok(())
}

/// Validate every store name and reject collisions.
///
/// Runs before anything touches the filesystem, so a bad batch leaves the
/// output root untouched.
pub fn validate_batch(stores: &[StoreSpec]) -> Result<(), StoreNameError> {
  let mut seen = HashSet::with_capacity(stores.len());

  for store in stores {
    validate_store_name(&store.name)?;
    if !seen.insert(store.name.as_str()) {
      return Err(StoreNameError::Duplicate(store.name.clone()));
    }
  }

  Ok(())
}
