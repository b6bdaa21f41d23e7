//! Batch configuration.
//!
//! A batch is read from a TOML file describing the shared source tree, the
//! build commands and the list of stores. `source_root` is resolved against
//! the file's directory; `output_root` and `static_profile` are resolved
//! against the source root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::api::ApiConfig;
use crate::consts::{DEFAULT_EXCLUSIONS, DEFAULT_OUTPUT_DIR, DEFAULT_STATIC_PROFILE};
use crate::replicate::ExclusionMode;
use crate::runner::RunnerConfig;
use crate::store::StoreSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("parallelism must be at least 1")]
  ZeroParallelism,

  #[error("store '{0}' is not defined in the batch")]
  UnknownStore(String),
}

/// Resolved options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
  pub source_root: PathBuf,
  pub output_root: PathBuf,
  pub exclusions: Vec<String>,
  pub exclusion_mode: ExclusionMode,
  pub static_profile: PathBuf,
  pub runner: RunnerConfig,
  /// Number of stores built at once. 1 builds strictly one after another.
  pub parallelism: usize,
  /// Batch-wide data API settings, handed to every store without its own.
  pub api: Option<ApiConfig>,
}

impl GenerationOptions {
  /// Defaults for a project rooted at `source_root`.
  pub fn new(source_root: impl Into<PathBuf>) -> Self {
    let source_root = source_root.into();
    Self {
      output_root: source_root.join(DEFAULT_OUTPUT_DIR),
      static_profile: source_root.join(DEFAULT_STATIC_PROFILE),
      source_root,
      exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
      exclusion_mode: ExclusionMode::default(),
      runner: RunnerConfig::default(),
      parallelism: 1,
      api: None,
    }
  }
}

/// On-disk shape of a batch file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
  pub source_root: Option<PathBuf>,
  pub output_root: Option<PathBuf>,
  #[serde(default)]
  pub skip_install: bool,
  pub exclusions: Option<Vec<String>>,
  #[serde(default)]
  pub exclusion_mode: ExclusionMode,
  pub static_profile: Option<PathBuf>,
  pub install_command: Option<String>,
  pub build_command: Option<String>,
  pub command_timeout_secs: Option<u64>,
  pub shell: Option<String>,
  pub parallelism: Option<usize>,
  pub api: Option<ApiConfig>,
  #[serde(default)]
  pub stores: Vec<StoreSpec>,
}

/// Stores plus the options to build them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
  pub options: GenerationOptions,
  pub stores: Vec<StoreSpec>,
}

impl Batch {
  /// Load and resolve a batch file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    let base_dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    let batch = Self::parse(&content, base_dir).map_err(|e| match e {
      ConfigError::Parse { message, .. } => ConfigError::Parse {
        path: path.to_path_buf(),
        message,
      },
      other => other,
    })?;
    debug!(path = ?path, stores = batch.stores.len(), "batch loaded");
    Ok(batch)
  }

  /// Parse batch TOML, resolving relative paths against `base_dir`.
  pub fn parse(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let file: BatchFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
      path: PathBuf::new(),
      message: e.to_string(),
    })?;
    file.resolve(base_dir)
  }

  /// Keep only the named stores, in batch order.
  pub fn select(&mut self, names: &[String]) -> Result<(), ConfigError> {
    if names.is_empty() {
      return Ok(());
    }
    if let Some(unknown) = names.iter().find(|n| !self.stores.iter().any(|s| &s.name == *n)) {
      return Err(ConfigError::UnknownStore(unknown.clone()));
    }
    self.stores.retain(|store| names.contains(&store.name));
    Ok(())
  }
}

impl BatchFile {
  fn resolve(self, base_dir: &Path) -> Result<Batch, ConfigError> {
    let source_root = match self.source_root {
      Some(root) => base_dir.join(root),
      None => base_dir.to_path_buf(),
    };

    let mut options = GenerationOptions::new(&source_root);

    if let Some(output_root) = self.output_root {
      options.output_root = source_root.join(output_root);
    }
    if let Some(profile) = self.static_profile {
      options.static_profile = source_root.join(profile);
    }
    if let Some(exclusions) = self.exclusions {
      options.exclusions = exclusions;
    }
    options.exclusion_mode = self.exclusion_mode;

    options.runner.skip_install = self.skip_install;
    if let Some(cmd) = self.install_command {
      options.runner.install_command = cmd;
    }
    if let Some(cmd) = self.build_command {
      options.runner.build_command = cmd;
    }
    options.runner.timeout = self.command_timeout_secs.map(Duration::from_secs);
    options.runner.shell = self.shell;

    if let Some(parallelism) = self.parallelism {
      if parallelism == 0 {
        return Err(ConfigError::ZeroParallelism);
      }
      options.parallelism = parallelism;
    }
    options.api = self.api;

    Ok(Batch {
      options,
      stores: self.stores,
    })
  }
}
