//! Types for store generation.
//!
//! This module defines the per-store stages, the errors that can stop a
//! store, and the report produced for a whole batch.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::env_file::EnvFileError;
use crate::manifest::ManifestError;
use crate::overlay::OverlayError;
use crate::relocate::RelocateError;
use crate::replicate::ReplicateError;
use crate::runner::RunError;
use crate::store::StoreNameError;

/// Where a store is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Pending,
  Replicating,
  Overlaying,
  ConfiguringEnv,
  PatchingManifest,
  Building,
  Relocating,
  Done,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Pending => "pending",
      Stage::Replicating => "replicating",
      Stage::Overlaying => "overlaying",
      Stage::ConfiguringEnv => "configuring env",
      Stage::PatchingManifest => "patching manifest",
      Stage::Building => "building",
      Stage::Relocating => "relocating",
      Stage::Done => "done",
    };
    f.write_str(name)
  }
}

/// Errors that stop a single store. They never stop the batch.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to clean {}: {source}", path.display())]
  Clean {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Replicate(#[from] ReplicateError),

  #[error(transparent)]
  Overlay(#[from] OverlayError),

  #[error(transparent)]
  EnvFile(#[from] EnvFileError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Run(#[from] RunError),

  #[error(transparent)]
  Relocate(#[from] RelocateError),

  #[error("cancelled before start")]
  Cancelled,

  #[error("store task failed: {0}")]
  Task(String),
}

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  Io,
  ConfigMissing,
  ManifestParse,
  ExternalCommand,
  TimedOut,
  Cancelled,
  Internal,
}

impl StoreError {
  pub fn kind(&self) -> FailureKind {
    match self {
      StoreError::Clean { .. }
      | StoreError::Replicate(_)
      | StoreError::EnvFile(_)
      | StoreError::Relocate(_)
      | StoreError::Manifest(ManifestError::Read { .. } | ManifestError::Write { .. })
      | StoreError::Overlay(OverlayError::Copy { .. }) => FailureKind::Io,
      StoreError::Overlay(OverlayError::MissingProfileFile { .. }) => FailureKind::ConfigMissing,
      StoreError::Manifest(ManifestError::Parse { .. }) => FailureKind::ManifestParse,
      StoreError::Run(RunError::TimedOut { .. }) => FailureKind::TimedOut,
      StoreError::Run(RunError::Cancelled { .. }) | StoreError::Cancelled => FailureKind::Cancelled,
      StoreError::Run(_) => FailureKind::ExternalCommand,
      StoreError::Task(_) => FailureKind::Internal,
    }
  }
}

/// Errors that stop the whole batch before any store starts.
#[derive(Debug, Error)]
pub enum BatchError {
  #[error("invalid store batch: {0}")]
  InvalidStores(#[from] StoreNameError),

  #[error("source root not found: {}", path.display())]
  SourceMissing { path: PathBuf },

  /// The output root would put a store tree on top of the source project.
  #[error(
    "output root {} overlaps source root {}{}",
    output_root.display(),
    source_root.display(),
    store.as_ref().map(|s| format!(" (store '{s}')")).unwrap_or_default()
  )]
  OutputOverlapsSource {
    output_root: PathBuf,
    source_root: PathBuf,
    store: Option<String>,
  },

  #[error("failed to create output root {}: {source}", path.display())]
  CreateOutputRoot {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Terminal state of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
  /// `static_dir` is `None` when the build produced no output directory.
  Done { static_dir: Option<PathBuf> },
  Failed {
    stage: Stage,
    kind: FailureKind,
    reason: String,
  },
}

impl BuildOutcome {
  pub fn is_done(&self) -> bool {
    matches!(self, BuildOutcome::Done { .. })
  }
}

/// Result for one store, at its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReport {
  pub index: usize,
  pub name: String,
  pub tree: PathBuf,
  pub outcome: BuildOutcome,
  pub duration_ms: u64,
}

/// Results for every store, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  pub stores: Vec<StoreReport>,
}

impl BatchReport {
  pub fn total(&self) -> usize {
    self.stores.len()
  }

  pub fn succeeded(&self) -> impl Iterator<Item = &StoreReport> {
    self.stores.iter().filter(|s| s.outcome.is_done())
  }

  pub fn failed(&self) -> impl Iterator<Item = &StoreReport> {
    self.stores.iter().filter(|s| !s.outcome.is_done())
  }

  /// Returns true if every store reached `Done`.
  pub fn is_success(&self) -> bool {
    self.stores.iter().all(|s| s.outcome.is_done())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn report(index: usize, outcome: BuildOutcome) -> StoreReport {
    StoreReport {
      index,
      name: format!("store-{index}"),
      tree: PathBuf::from(format!("/out/store-{index}")),
      outcome,
      duration_ms: 0,
    }
  }

  fn failed() -> BuildOutcome {
    BuildOutcome::Failed {
      stage: Stage::Building,
      kind: FailureKind::ExternalCommand,
      reason: "boom".to_string(),
    }
  }

  #[test]
  fn empty_report_is_success() {
    let report = BatchReport::default();
    assert!(report.is_success());
    assert_eq!(report.total(), 0);
  }

  #[test]
  fn counts_outcomes() {
    let report = BatchReport {
      stores: vec![
        report(0, BuildOutcome::Done { static_dir: None }),
        report(1, failed()),
        report(2, BuildOutcome::Done { static_dir: None }),
      ],
    };

    assert!(!report.is_success());
    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(report.failed().map(|s| s.index).collect::<Vec<_>>(), vec![1]);
  }

  #[test]
  fn classifies_errors() {
    let cwd = PathBuf::from("/tree");
    let cases = [
      (
        StoreError::Run(RunError::CommandFailed {
          cmd: "npm run build".to_string(),
          cwd: cwd.clone(),
          code: Some(1),
        }),
        FailureKind::ExternalCommand,
      ),
      (
        StoreError::Run(RunError::TimedOut {
          cmd: "npm install".to_string(),
          cwd: cwd.clone(),
          timeout: Duration::from_secs(1),
        }),
        FailureKind::TimedOut,
      ),
      (
        StoreError::Overlay(OverlayError::MissingProfileFile {
          path: PathBuf::from("utils/static/package.json"),
        }),
        FailureKind::ConfigMissing,
      ),
      (
        StoreError::Manifest(ManifestError::Parse {
          path: cwd.join("package.json"),
          message: "eof".to_string(),
        }),
        FailureKind::ManifestParse,
      ),
      (StoreError::Cancelled, FailureKind::Cancelled),
    ];

    for (err, kind) in cases {
      assert_eq!(err.kind(), kind, "{err}");
    }
  }

  #[test]
  fn outcome_serializes_with_status_tag() {
    let json = serde_json::to_value(failed()).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["stage"], "building");
    assert_eq!(json["kind"], "external_command");
  }

  #[test]
  fn stage_display() {
    assert_eq!(Stage::PatchingManifest.to_string(), "patching manifest");
    assert_eq!(Stage::Pending.to_string(), "pending");
  }
}
