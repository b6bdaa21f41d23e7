//! Implementation of the `storegen generate` command.
//!
//! Loads a batch file, applies command-line overrides and builds every
//! selected store. Store failures are reported in the summary; only problems
//! with the batch itself make the command fail.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use storegen_lib::generate::{BatchReport, BuildOutcome, Orchestrator};
use storegen_lib::replicate::ExclusionMode;
use storegen_lib::runner::CancelToken;

use crate::output::{format_duration, print_failure, print_json, print_stat, print_success, symbols};

pub struct GenerateArgs {
  pub config: PathBuf,
  pub skip_install: bool,
  pub parallel: Option<NonZeroUsize>,
  pub timeout: Option<Duration>,
  pub legacy_name_exclusion: bool,
  pub output: Option<PathBuf>,
  pub only: Vec<String>,
  pub json: bool,
}

pub fn cmd_generate(args: GenerateArgs) -> Result<()> {
  let mut batch = super::load_batch(&args.config)?;
  batch.select(&args.only)?;

  let options = &mut batch.options;
  if args.skip_install {
    options.runner.skip_install = true;
  }
  if let Some(parallel) = args.parallel {
    options.parallelism = parallel.get();
  }
  if args.timeout.is_some() {
    options.runner.timeout = args.timeout;
  }
  if args.legacy_name_exclusion {
    options.exclusion_mode = ExclusionMode::Name;
  }
  if let Some(output) = args.output {
    options.output_root = output;
  }

  let cancel = CancelToken::new();
  let orchestrator = Orchestrator::new(batch.options).with_cancel(cancel.clone());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(async {
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          warn!("interrupted, stopping builds");
          cancel.cancel();
        }
      });
      orchestrator.generate(&batch.stores).await
    })
    .context("Generation failed")?;

  if args.json {
    print_json(&report)?;
  } else {
    print_summary(&report);
  }

  Ok(())
}

fn print_summary(report: &BatchReport) {
  println!();
  for store in &report.stores {
    let took = format_duration(Duration::from_millis(store.duration_ms));
    match &store.outcome {
      BuildOutcome::Done { static_dir: Some(dir) } => {
        print_success(&format!(
          "{} {} {} ({})",
          store.name,
          symbols::ARROW,
          dir.display(),
          took
        ));
      }
      BuildOutcome::Done { static_dir: None } => {
        print_success(&format!("{} (no build output, {})", store.name, took));
      }
      BuildOutcome::Failed { stage, reason, .. } => {
        print_failure(&format!("{} failed while {}: {}", store.name, stage, reason));
      }
    }
  }

  println!();
  print_stat("Stores", &report.total().to_string());
  print_stat("Succeeded", &report.succeeded().count().to_string());
  print_stat("Failed", &report.failed().count().to_string());
}
