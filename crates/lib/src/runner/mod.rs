//! Build runner.
//!
//! Runs the dependency install and production build commands for one
//! replicated tree, strictly one after the other.

mod cancel;
mod cmd;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::consts::{DEFAULT_BUILD_COMMAND, DEFAULT_INSTALL_COMMAND, STORE_ENV_VAR};

pub use cancel::CancelToken;
pub use cmd::{CommandSpec, run_command};

/// Errors from external command execution.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("failed to start '{cmd}' in {}: {source}", cwd.display())]
  Spawn {
    cmd: String,
    cwd: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("command '{cmd}' failed with exit code {code:?} in {}", cwd.display())]
  CommandFailed { cmd: String, cwd: PathBuf, code: Option<i32> },

  #[error("command '{cmd}' timed out after {timeout:?} in {}", cwd.display())]
  TimedOut { cmd: String, cwd: PathBuf, timeout: Duration },

  #[error("command '{cmd}' cancelled in {}", cwd.display())]
  Cancelled { cmd: String, cwd: PathBuf },

  #[error("failed to wait for '{cmd}': {source}")]
  Wait {
    cmd: String,
    #[source]
    source: std::io::Error,
  },
}

/// Commands and limits for the build runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
  pub install_command: String,
  pub build_command: String,
  pub skip_install: bool,
  /// Per-command limit. `None` waits forever.
  pub timeout: Option<Duration>,
  /// Shell override. `None` uses the platform default.
  pub shell: Option<String>,
  /// Let commands read the terminal. Only sound when one store builds at a time.
  pub inherit_stdin: bool,
}

impl Default for RunnerConfig {
  fn default() -> Self {
    Self {
      install_command: DEFAULT_INSTALL_COMMAND.to_string(),
      build_command: DEFAULT_BUILD_COMMAND.to_string(),
      skip_install: false,
      timeout: None,
      shell: None,
      inherit_stdin: false,
    }
  }
}

/// Runs install and build for a store's tree.
#[derive(Debug, Clone)]
pub struct BuildRunner {
  config: RunnerConfig,
  cancel: CancelToken,
}

impl BuildRunner {
  pub fn new(config: RunnerConfig, cancel: CancelToken) -> Self {
    Self { config, cancel }
  }

  /// Install dependencies (unless skipped), then build.
  ///
  /// The build is not attempted if the install fails.
  pub async fn run(&self, tree: &Path, store: &str) -> Result<(), RunError> {
    if self.config.skip_install {
      info!(store = %store, "skipping dependency install");
    } else {
      info!(store = %store, "installing dependencies");
      self.run_one(&self.config.install_command, tree, store).await?;
    }

    info!(store = %store, "building static export");
    self.run_one(&self.config.build_command, tree, store).await
  }

  async fn run_one(&self, cmd: &str, tree: &Path, store: &str) -> Result<(), RunError> {
    let env = [(STORE_ENV_VAR, store)];
    let spec = CommandSpec {
      cmd,
      cwd: tree,
      env: &env,
      shell: self.config.shell.as_deref(),
      timeout: self.config.timeout,
      inherit_stdin: self.config.inherit_stdin,
    };
    run_command(&spec, &self.cancel).await
  }
}
