//! Inspect command implementation.
//!
//! Shows, for each store in a batch, whether its static output exists and
//! which variables its environment file holds.

use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use storegen_lib::consts::{ENV_FILE_NAME, STATIC_OUTPUT_DIR};
use storegen_lib::env_file::read_env_file;

use crate::output::{print_failure, print_info, print_json, print_stat, print_success};

#[derive(Debug, Serialize)]
struct StoreState {
  name: String,
  tree_exists: bool,
  static_exists: bool,
  env: Option<IndexMap<String, String>>,
}

pub fn cmd_inspect(config: &Path, verbose: bool, json: bool) -> Result<()> {
  let batch = super::load_batch(config)?;

  let mut states = Vec::with_capacity(batch.stores.len());
  for store in &batch.stores {
    let tree = batch.options.output_root.join(&store.name);
    let env = if tree.join(ENV_FILE_NAME).is_file() {
      Some(read_env_file(&tree)?)
    } else {
      None
    };
    states.push(StoreState {
      name: store.name.clone(),
      tree_exists: tree.is_dir(),
      static_exists: tree.join(STATIC_OUTPUT_DIR).is_dir(),
      env,
    });
  }

  if json {
    return print_json(&states);
  }

  if states.is_empty() {
    print_info("No stores defined.");
    return Ok(());
  }

  for state in &states {
    if state.static_exists {
      print_success(&format!("{}: static output present", state.name));
    } else if state.tree_exists {
      print_failure(&format!("{}: no static output", state.name));
    } else {
      print_info(&format!("{}: not generated", state.name));
    }

    if let Some(env) = &state.env {
      print_stat("Variables", &env.len().to_string());
      if verbose {
        for (key, value) in env {
          println!("    {}={}", key, value);
        }
      } else {
        for key in env.keys() {
          println!("    {}", key);
        }
      }
    }
  }

  Ok(())
}
