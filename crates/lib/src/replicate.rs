//! Tree replication.
//!
//! Copies the shared source project into a store's own directory, skipping
//! excluded entries. Symlinks are followed so the replica holds real files;
//! a link pointing back at one of its ancestors is reported instead of being
//! walked forever.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// How exclusion entries are matched against the walked tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionMode {
  /// Entries are paths relative to the source root.
  #[default]
  Path,
  /// Entries are bare names matched at any depth.
  Name,
}

/// Errors raised while replicating a tree.
#[derive(Debug, Error)]
pub enum ReplicateError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to copy {}: {source}", path.display())]
  Copy {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("symlink cycle at {}: points back to {}", path.display(), ancestor.display())]
  SymlinkCycle { path: PathBuf, ancestor: PathBuf },

  #[error("failed to walk {}: {message}", root.display())]
  Walk { root: PathBuf, message: String },
}

/// Set of entries skipped during replication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
  mode: ExclusionMode,
  names: HashSet<String>,
  paths: HashSet<PathBuf>,
}

impl Exclusions {
  pub fn new<I, S>(mode: ExclusionMode, entries: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut exclusions = Self {
      mode,
      ..Self::default()
    };
    for entry in entries {
      exclusions.insert(entry.as_ref());
    }
    exclusions
  }

  pub fn mode(&self) -> ExclusionMode {
    self.mode
  }

  /// Add an entry. In path mode it is taken relative to the source root.
  pub fn insert(&mut self, entry: &str) {
    match self.mode {
      ExclusionMode::Name => {
        self.names.insert(entry.to_string());
      }
      ExclusionMode::Path => {
        let normalized = normalize(Path::new(entry));
        if !normalized.as_os_str().is_empty() {
          self.paths.insert(normalized);
        }
      }
    }
  }

  /// Always exclude a path relative to the source root, whatever the mode.
  ///
  /// Used for the output root when it lives inside the source tree.
  pub fn insert_path(&mut self, relative: &Path) {
    let normalized = normalize(relative);
    if !normalized.as_os_str().is_empty() {
      self.paths.insert(normalized);
    }
  }

  /// Whether an entry, given by its path relative to the source root, is skipped.
  pub fn is_excluded(&self, relative: &Path) -> bool {
    if self.paths.contains(relative) {
      return true;
    }

    match self.mode {
      ExclusionMode::Path => false,
      ExclusionMode::Name => relative
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| self.names.contains(name)),
    }
  }
}

fn normalize(path: &Path) -> PathBuf {
  path
    .components()
    .filter(|c| matches!(c, Component::Normal(_)))
    .collect()
}

/// Counters for a finished replication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaStats {
  pub files: usize,
  pub dirs: usize,
  pub bytes: u64,
}

/// Mirror `source` into `target`, skipping excluded entries.
///
/// Walks `source` in file-name order:
/// - Excluded entries are pruned, so nothing below an excluded directory is visited
/// - Directories are recreated, regular files are copied byte for byte
/// - Symlinks are followed; a link back to one of its ancestors is an error
/// - Other special files are skipped
///
/// `target` and its parents are created if needed. Existing files in `target`
/// are overwritten; nothing is removed.
///
/// # Arguments
///
/// * `source` - Root of the tree to copy
/// * `target` - Directory that receives the copy
/// * `exclusions` - Entries to skip, matched on paths relative to `source`
///
/// # Returns
///
/// Counts of the files, directories and bytes copied.
pub fn replicate_tree(source: &Path, target: &Path, exclusions: &Exclusions) -> Result<ReplicaStats, ReplicateError> {
  debug!(source = ?source, target = ?target, mode = ?exclusions.mode(), "replicating tree");

  fs::create_dir_all(target).map_err(|e| ReplicateError::CreateDir {
    path: target.to_path_buf(),
    source: e,
  })?;

  let walker = WalkDir::new(source)
    .follow_links(true)
    .sort_by_file_name()
    .min_depth(1)
    .into_iter()
    .filter_entry(|entry| match entry.path().strip_prefix(source) {
      Ok(relative) => !exclusions.is_excluded(relative),
      Err(_) => true,
    });

  let mut stats = ReplicaStats::default();

  for entry in walker {
    let entry = entry.map_err(|e| walk_error(source, e))?;
    let Ok(relative) = entry.path().strip_prefix(source) else {
      continue;
    };
    let dest = target.join(relative);

    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&dest).map_err(|e| ReplicateError::CreateDir { path: dest, source: e })?;
      stats.dirs += 1;
    } else if file_type.is_file() {
      if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| ReplicateError::CreateDir {
          path: parent.to_path_buf(),
          source: e,
        })?;
      }
      let copied = fs::copy(entry.path(), &dest).map_err(|e| ReplicateError::Copy {
        path: entry.path().to_path_buf(),
        source: e,
      })?;
      stats.files += 1;
      stats.bytes += copied;
    } else {
      debug!(path = ?entry.path(), "skipping special file");
    }
  }

  debug!(files = stats.files, dirs = stats.dirs, bytes = stats.bytes, "tree replicated");

  Ok(stats)
}

fn walk_error(root: &Path, err: walkdir::Error) -> ReplicateError {
  if let Some(ancestor) = err.loop_ancestor() {
    return ReplicateError::SymlinkCycle {
      path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
      ancestor: ancestor.to_path_buf(),
    };
  }

  let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
  let message = err.to_string();
  match err.into_io_error() {
    Some(source) => ReplicateError::Io { path, source },
    None => ReplicateError::Walk {
      root: root.to_path_buf(),
      message,
    },
  }
}
