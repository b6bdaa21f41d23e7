//! Multi-store generation.
//!
//! This module drives every store through its pipeline:
//! - Replicate the source tree (after wiping the previous one)
//! - Apply the static profile overlay
//! - Write the store's environment file
//! - Patch the package manifest name
//! - Run install and build
//! - Relocate the build output to `static/`
//!
//! A failing store is logged and recorded; the batch always moves on to the
//! next store. Stores own disjoint subtrees of the output root, so running
//! several at once needs no coordination beyond a permit count.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::api::ApiConfig;
use crate::config::GenerationOptions;
use crate::env_file::write_env_file;
use crate::manifest::patch_manifest;
use crate::overlay::{OVERLAY_FILES, apply_static_overlay, missing_profile_file};
use crate::relocate::{Relocation, relocate_output};
use crate::replicate::{Exclusions, replicate_tree};
use crate::runner::{BuildRunner, CancelToken, RunnerConfig};
use crate::store::{StoreSpec, validate_batch};

pub use types::{BatchError, BatchReport, BuildOutcome, FailureKind, Stage, StoreError, StoreReport};

/// What a batch would do, computed without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
  /// Store name and the tree it would be built in, in batch order.
  pub trees: Vec<(String, PathBuf)>,
  /// First static profile file that is missing, which would fail every store.
  pub missing_profile: Option<PathBuf>,
}

/// Validate a batch and describe the trees it would produce.
pub fn preflight(options: &GenerationOptions, stores: &[StoreSpec]) -> Result<Preflight, BatchError> {
  validate_batch(stores)?;

  if !options.source_root.is_dir() {
    return Err(BatchError::SourceMissing {
      path: options.source_root.clone(),
    });
  }
  let source_root = dunce::canonicalize(&options.source_root).map_err(|_| BatchError::SourceMissing {
    path: options.source_root.clone(),
  })?;
  check_overlap(&source_root, &resolve_lenient(&options.output_root), stores)?;

  Ok(Preflight {
    trees: stores
      .iter()
      .map(|s| (s.name.clone(), options.output_root.join(&s.name)))
      .collect(),
    missing_profile: missing_profile_file(&options.static_profile),
  })
}

/// Shared, read-only state for all store pipelines of one batch.
#[derive(Debug)]
struct Context {
  source_root: PathBuf,
  output_root: PathBuf,
  static_profile: PathBuf,
  exclusions: Exclusions,
  runner: BuildRunner,
  api: Option<ApiConfig>,
  cancel: CancelToken,
}

/// Drives a batch of stores through their pipelines.
pub struct Orchestrator {
  options: GenerationOptions,
  cancel: CancelToken,
}

impl Orchestrator {
  pub fn new(options: GenerationOptions) -> Self {
    Self {
      options,
      cancel: CancelToken::new(),
    }
  }

  /// Use an externally controlled cancellation token.
  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn cancel_token(&self) -> CancelToken {
    self.cancel.clone()
  }

  /// Build every store and report one outcome per store, in input order.
  ///
  /// Before anything is written, the batch is checked as a whole:
  /// - Store names are valid path segments and unique
  /// - The source root exists
  /// - No store tree would land on or above the source root
  /// - The output root can be created
  ///
  /// After that, a failing store is recorded in the report and the batch moves on.
  ///
  /// # Arguments
  ///
  /// * `stores` - Stores to build, in the order they should be reported
  ///
  /// # Returns
  ///
  /// A [`BatchReport`] with one [`StoreReport`] per input store, or a
  /// [`BatchError`] if a batch-level check failed.
  pub async fn generate(&self, stores: &[StoreSpec]) -> Result<BatchReport, BatchError> {
    validate_batch(stores)?;
    let ctx = Arc::new(self.prepare(stores)?);

    info!(
      stores = stores.len(),
      parallelism = self.options.parallelism,
      "starting static site generation"
    );

    let reports = if self.options.parallelism <= 1 {
      let mut reports = Vec::with_capacity(stores.len());
      for (index, store) in stores.iter().enumerate() {
        reports.push(build_store(&ctx, index, store).await);
      }
      reports
    } else {
      build_parallel(&ctx, stores, self.options.parallelism).await
    };

    let report = BatchReport { stores: reports };

    info!(
      done = report.succeeded().count(),
      failed = report.failed().count(),
      "static site generation complete"
    );

    Ok(report)
  }

  fn prepare(&self, stores: &[StoreSpec]) -> Result<Context, BatchError> {
    let options = &self.options;

    if !options.source_root.is_dir() {
      return Err(BatchError::SourceMissing {
        path: options.source_root.clone(),
      });
    }
    let source_root = dunce::canonicalize(&options.source_root).map_err(|_| BatchError::SourceMissing {
      path: options.source_root.clone(),
    })?;
    check_overlap(&source_root, &resolve_lenient(&options.output_root), stores)?;

    fs::create_dir_all(&options.output_root).map_err(|e| BatchError::CreateOutputRoot {
      path: options.output_root.clone(),
      source: e,
    })?;
    let output_root = dunce::canonicalize(&options.output_root).map_err(|e| BatchError::CreateOutputRoot {
      path: options.output_root.clone(),
      source: e,
    })?;

    let mut exclusions = Exclusions::new(options.exclusion_mode, &options.exclusions);
    for name in OVERLAY_FILES {
      exclusions.insert(name);
    }
    if let Ok(relative) = output_root.strip_prefix(&source_root) {
      debug!(path = ?relative, "output root is inside the source tree, excluding it");
      exclusions.insert_path(relative);
    }

    Ok(Context {
      source_root,
      output_root,
      static_profile: options.static_profile.clone(),
      exclusions,
      runner: BuildRunner::new(runner_config(options), self.cancel.clone()),
      api: options.api.clone(),
      cancel: self.cancel.clone(),
    })
  }
}

/// Runner settings for a batch. Commands may only prompt when stores build one at a time.
fn runner_config(options: &GenerationOptions) -> RunnerConfig {
  RunnerConfig {
    inherit_stdin: options.parallelism <= 1,
    ..options.runner.clone()
  }
}

/// Reject layouts where a store tree would land on or above the source project.
///
/// Both roots must already be absolute and free of symlinks. Store trees are
/// wiped before replication, so none of them may contain the source.
fn check_overlap(source_root: &Path, output_root: &Path, stores: &[StoreSpec]) -> Result<(), BatchError> {
  let overlap = |store: Option<&str>| BatchError::OutputOverlapsSource {
    output_root: output_root.to_path_buf(),
    source_root: source_root.to_path_buf(),
    store: store.map(str::to_string),
  };

  if output_root == source_root {
    return Err(overlap(None));
  }
  if let Some(store) = stores
    .iter()
    .find(|s| source_root.starts_with(output_root.join(&s.name)))
  {
    return Err(overlap(Some(&store.name)));
  }

  Ok(())
}

/// Canonicalize the longest existing prefix of `path` and append the rest.
///
/// The output root usually does not exist yet, so plain canonicalization would fail.
fn resolve_lenient(path: &Path) -> PathBuf {
  let mut missing = Vec::new();
  let mut current = path;

  loop {
    if let Ok(real) = dunce::canonicalize(current) {
      return missing.into_iter().rev().fold(real, |acc: PathBuf, part| acc.join(part));
    }
    let (Some(parent), Some(name)) = (current.parent(), current.file_name()) else {
      return path.to_path_buf();
    };
    missing.push(name.to_os_string());
    current = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
  }
}

/// Run stores concurrently, bounded by `parallelism`, keeping input order.
async fn build_parallel(ctx: &Arc<Context>, stores: &[StoreSpec], parallelism: usize) -> Vec<StoreReport> {
  let semaphore = Arc::new(Semaphore::new(parallelism));
  let mut join_set = JoinSet::new();

  for (index, store) in stores.iter().enumerate() {
    let ctx = ctx.clone();
    let store = store.clone();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      let _permit = semaphore.acquire_owned().await;
      build_store(&ctx, index, &store).await
    });
  }

  let mut slots: Vec<Option<StoreReport>> = vec![None; stores.len()];
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(report) => {
        let index = report.index;
        slots[index] = Some(report);
      }
      Err(e) => error!(error = %e, "store task panicked"),
    }
  }

  slots
    .into_iter()
    .zip(stores)
    .enumerate()
    .map(|(index, (slot, store))| {
      slot.unwrap_or_else(|| StoreReport {
        index,
        name: store.name.clone(),
        tree: ctx.output_root.join(&store.name),
        outcome: BuildOutcome::Failed {
          stage: Stage::Pending,
          kind: FailureKind::Internal,
          reason: StoreError::Task("task panicked".to_string()).to_string(),
        },
        duration_ms: 0,
      })
    })
    .collect()
}

/// Run one store to a terminal state, absorbing any stage error.
async fn build_store(ctx: &Arc<Context>, index: usize, store: &StoreSpec) -> StoreReport {
  let started = Instant::now();
  let tree = ctx.output_root.join(&store.name);
  let mut stage = Stage::Pending;

  info!(store = %store.name, "processing store");

  let outcome = match run_pipeline(ctx, store, &tree, &mut stage).await {
    Ok(relocation) => {
      info!(store = %store.name, "successfully generated static site");
      BuildOutcome::Done {
        static_dir: match relocation {
          Relocation::Moved { to } => Some(to),
          Relocation::Skipped => None,
        },
      }
    }
    Err(e) => {
      error!(store = %store.name, stage = %stage, error = %e, "failed to generate static site");
      BuildOutcome::Failed {
        stage,
        kind: e.kind(),
        reason: e.to_string(),
      }
    }
  };

  StoreReport {
    index,
    name: store.name.clone(),
    tree,
    outcome,
    duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
  }
}

async fn run_pipeline(
  ctx: &Arc<Context>,
  store: &StoreSpec,
  tree: &Path,
  stage: &mut Stage,
) -> Result<Relocation, StoreError> {
  if ctx.cancel.is_cancelled() {
    return Err(StoreError::Cancelled);
  }

  *stage = Stage::Replicating;
  let copy_ctx = ctx.clone();
  let copy_tree = tree.to_path_buf();
  let stats = tokio::task::spawn_blocking(move || {
    clean_tree(&copy_tree)?;
    replicate_tree(&copy_ctx.source_root, &copy_tree, &copy_ctx.exclusions).map_err(StoreError::from)
  })
  .await
  .map_err(|e| StoreError::Task(e.to_string()))??;
  info!(store = %store.name, files = stats.files, dirs = stats.dirs, "project files copied");

  *stage = Stage::Overlaying;
  apply_static_overlay(&ctx.static_profile, tree)?;

  *stage = Stage::ConfiguringEnv;
  let mut vars = store.config.clone();
  if let Some(api) = store.api.as_ref().or(ctx.api.as_ref()) {
    api.inject_into(&mut vars);
  }
  write_env_file(tree, &vars)?;

  *stage = Stage::PatchingManifest;
  let patched = patch_manifest(tree, &store.name)?;
  debug!(store = %store.name, name = %patched.current, "package renamed");

  *stage = Stage::Building;
  ctx.runner.run(tree, &store.name).await?;

  *stage = Stage::Relocating;
  let relocation = relocate_output(tree)?;

  *stage = Stage::Done;
  Ok(relocation)
}

/// Remove a previous tree so the new one starts empty.
fn clean_tree(tree: &Path) -> Result<(), StoreError> {
  if !tree.exists() {
    return Ok(());
  }
  info!(path = ?tree, "cleaning existing directory");
  fs::remove_dir_all(tree).map_err(|e| StoreError::Clean {
    path: tree.to_path_buf(),
    source: e,
  })
}
