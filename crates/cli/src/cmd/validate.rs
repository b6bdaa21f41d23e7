//! Validate command: checks a batch without touching the filesystem.

use std::path::Path;

use anyhow::{Result, bail};

use storegen_lib::generate::preflight;

use crate::output::{print_info, print_stat, print_success, symbols};

pub fn cmd_validate(config: &Path) -> Result<()> {
  let batch = super::load_batch(config)?;
  let options = &batch.options;
  let plan = preflight(options, &batch.stores)?;

  if let Some(missing) = plan.missing_profile {
    bail!("static profile file not found: {}", missing.display());
  }

  print_success(&format!("{} is valid", config.display()));
  print_stat("Source", &options.source_root.display().to_string());
  print_stat("Output", &options.output_root.display().to_string());
  print_stat("Parallelism", &options.parallelism.to_string());
  println!();

  if plan.trees.is_empty() {
    print_info("No stores defined.");
    return Ok(());
  }

  println!("Stores:");
  for (name, tree) in &plan.trees {
    println!("  {} {} {} {}", symbols::INFO, name, symbols::ARROW, tree.display());
  }

  Ok(())
}
