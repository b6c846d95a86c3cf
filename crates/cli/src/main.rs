mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// giftwrap - build OpenStack projects into packages or container images
#[derive(Parser)]
#[command(name = "giftwrap")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Artifact kind to build.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BuildType {
  /// Native packages via fpm
  #[default]
  Package,
  /// Container images via the Docker daemon
  Docker,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every project in a manifest
  Build {
    /// Path to the build manifest
    manifest: PathBuf,

    /// Kind of artifact to build
    #[arg(short = 't', long = "type", value_enum, default_value_t = BuildType::Package)]
    build_type: BuildType,

    /// Skip per-project artifacts
    #[arg(long)]
    all_in_one: bool,

    /// Give up on an image build after this long (e.g. "30m")
    #[arg(long, value_parser = humantime::parse_duration)]
    build_timeout: Option<Duration>,

    /// Kill any build command that runs longer than this (e.g. "10m")
    #[arg(long, value_parser = humantime::parse_duration)]
    command_timeout: Option<Duration>,
  },

  /// Validate a manifest and show the resolved projects
  Plan {
    /// Path to the build manifest
    manifest: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      manifest,
      build_type,
      all_in_one,
      build_timeout,
      command_timeout,
    } => cmd::cmd_build(
      &manifest,
      cmd::BuildArgs {
        build_type,
        all_in_one,
        build_timeout,
        command_timeout,
      },
    ),
    Commands::Plan { manifest, output } => cmd::cmd_plan(&manifest, cli.verbose, output),
  }
}
