mod api;
mod generate;
mod inspect;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use storegen_lib::config::Batch;

pub use api::cmd_api;
pub use generate::{GenerateArgs, cmd_generate};
pub use inspect::cmd_inspect;
pub use validate::cmd_validate;

/// Load a batch file, naming it in the error.
fn load_batch(config: &Path) -> Result<Batch> {
  Batch::load(config).with_context(|| format!("Failed to load batch file {}", config.display()))
}
