mod cmd;
mod output;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storegen_lib::consts::{APP_NAME, DEFAULT_BATCH_FILE};

use crate::cmd::GenerateArgs;

/// storegen - Build one static site per store from a shared storefront project
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate a static site for every store in a batch file
  Generate {
    /// Path to the batch file
    #[arg(default_value = DEFAULT_BATCH_FILE)]
    config: PathBuf,

    /// Skip the dependency install command
    #[arg(long)]
    skip_install: bool,

    /// Number of stores to build at once
    #[arg(long, value_name = "N")]
    parallel: Option<NonZeroUsize>,

    /// Time limit for each install or build command (e.g. 30m)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Exclude entries by name at any depth instead of by root-relative path
    #[arg(long)]
    legacy_name_exclusion: bool,

    /// Directory the store trees are written to
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Only build the named store (repeatable)
    #[arg(long, value_name = "STORE")]
    only: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Check a batch file and show what would be built
  Validate {
    /// Path to the batch file
    #[arg(default_value = DEFAULT_BATCH_FILE)]
    config: PathBuf,
  },

  /// Fetch records from the data API with a store's settings
  Api {
    /// Path to the batch file
    #[arg(default_value = DEFAULT_BATCH_FILE)]
    config: PathBuf,

    /// Store whose API settings are used
    #[arg(short, long)]
    store: String,

    /// Number of products to fetch
    #[arg(long, default_value_t = 4)]
    products: u32,

    /// Number of collections to fetch
    #[arg(long, default_value_t = 4)]
    collections: u32,
  },

  /// Show the state of each store's generated tree
  Inspect {
    /// Path to the batch file
    #[arg(default_value = DEFAULT_BATCH_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Generate {
      config,
      skip_install,
      parallel,
      timeout,
      legacy_name_exclusion,
      output,
      only,
      json,
    } => cmd::cmd_generate(GenerateArgs {
      config,
      skip_install,
      parallel,
      timeout,
      legacy_name_exclusion,
      output,
      only,
      json,
    }),
    Commands::Validate { config } => cmd::cmd_validate(&config),
    Commands::Api {
      config,
      store,
      products,
      collections,
    } => cmd::cmd_api(&config, &store, products, collections),
    Commands::Inspect { config, json } => cmd::cmd_inspect(&config, cli.verbose, json),
  }
}
