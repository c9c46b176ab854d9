/* src/cli/core/src/main.rs */

mod build;
mod config;
mod inspect;
mod serve;
mod site;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::build::{BuildOptions, run_build};
use crate::config::resolve_config;

#[derive(Parser)]
#[command(name = "purr", version, about = "Build and serve the Purrhaven rescue site")]
struct Cli {
  /// Path to purr.toml (default: nearest one at or above the current directory)
  #[arg(long, global = true)]
  config: Option<PathBuf>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Prerender every static path into the output directory
  Build {
    /// Output directory (overrides build.out_dir)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Pages rendered at once (overrides build.concurrency)
    #[arg(long)]
    concurrency: Option<usize>,
    /// Read data from a JSON fixture file instead of the backend
    #[arg(long)]
    fixtures: Option<PathBuf>,
  },
  /// Serve pages on demand
  Serve {
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    fixtures: Option<PathBuf>,
  },
  /// Print the paths a build would prerender
  Paths {
    #[arg(long)]
    fixtures: Option<PathBuf>,
  },
  /// Validate config and templates, and report the backend connection
  Check,
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

async fn run(cli: Cli) -> Result<()> {
  let config = resolve_config(cli.config.as_deref())?;
  match cli.command {
    Command::Build { out, concurrency, fixtures } => {
      let opts = BuildOptions::from_config(&config, out, concurrency, fixtures);
      run_build(&config, &opts).await?;
    }
    Command::Serve { port, fixtures } => serve::run_serve(&config, port, fixtures.as_deref()).await?,
    Command::Paths { fixtures } => inspect::run_paths(&config, fixtures.as_deref()).await?,
    Command::Check => inspect::run_check(&config).await?,
  }
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  init_logging();
  let cli = Cli::parse();
  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      ui::error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
