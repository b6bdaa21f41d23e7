//! Build output relocation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{BUILD_OUTPUT_DIR, STATIC_OUTPUT_DIR};

#[derive(Debug, Error)]
pub enum RelocateError {
  #[error("failed to remove stale output {}: {source}", path.display())]
  RemoveStale {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to move {} to {}: {source}", from.display(), to.display())]
  Rename {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// What the relocator did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
  /// The build produced no output directory.
  Skipped,
  Moved { to: PathBuf },
}

/// Move `<tree>/out` to `<tree>/static`, replacing any previous `static`.
pub fn relocate_output(tree: &Path) -> Result<Relocation, RelocateError> {
  let from = tree.join(BUILD_OUTPUT_DIR);
  if !from.is_dir() {
    debug!(path = ?from, "no build output, nothing to relocate");
    return Ok(Relocation::Skipped);
  }

  let to = tree.join(STATIC_OUTPUT_DIR);
  if to.exists() {
    remove_path(&to).map_err(|e| RelocateError::RemoveStale {
      path: to.clone(),
      source: e,
    })?;
  }

  fs::rename(&from, &to).map_err(|e| RelocateError::Rename {
    from: from.clone(),
    to: to.clone(),
    source: e,
  })?;

  info!(path = ?to, "static files moved");
  Ok(Relocation::Moved { to })
}

fn remove_path(path: &Path) -> std::io::Result<()> {
  if fs::symlink_metadata(path)?.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  }
}
