//! Static build overlay.
//!
//! Every replicated tree receives the static profile's package manifest and
//! framework config verbatim, replacing whatever the source project had.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{FRAMEWORK_CONFIG, PACKAGE_MANIFEST};

/// Files copied from the static profile, in copy order.
pub const OVERLAY_FILES: &[&str] = &[PACKAGE_MANIFEST, FRAMEWORK_CONFIG];

#[derive(Debug, Error)]
pub enum OverlayError {
  /// A mandatory profile file is absent. The tree cannot be built for static export.
  #[error("static profile file not found: {}", path.display())]
  MissingProfileFile { path: PathBuf },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Return the first overlay file missing from `profile_dir`, if any.
pub fn missing_profile_file(profile_dir: &Path) -> Option<PathBuf> {
  OVERLAY_FILES
    .iter()
    .map(|name| profile_dir.join(name))
    .find(|path| !path.is_file())
}

/// Copy the overlay files from `profile_dir` into `target`, overwriting.
pub fn apply_static_overlay(profile_dir: &Path, target: &Path) -> Result<(), OverlayError> {
  for name in OVERLAY_FILES {
    let from = profile_dir.join(name);
    if !from.is_file() {
      return Err(OverlayError::MissingProfileFile { path: from });
    }

    let to = target.join(name);
    fs::copy(&from, &to).map_err(|e| OverlayError::Copy {
      from: from.clone(),
      to: to.clone(),
      source: e,
    })?;
    debug!(from = ?from, to = ?to, "overlay file copied");
  }

  Ok(())
}
