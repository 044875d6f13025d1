//! opfuzz command-line tool
//!
//! Replays saved fuzz inputs through a harness outside of libFuzzer, lists
//! the registered harnesses and runs a quick deterministic smoke sweep.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use opfuzz_common::config::report_invalid;
use opfuzz_common::{ConfigError, HarnessConfig, PanicPolicy};
use std::path::PathBuf;
use tracing::error;

mod commands;
mod exit;

use commands::{ListCommand, ReplayCommand, SmokeCommand};

/// Operator fuzz harness tool
#[derive(Parser)]
#[command(name = "opfuzz")]
#[command(about = "Replay and smoke-test candle operator fuzz harnesses")]
#[command(long_about = r#"
Runs the same harnesses as the cargo-fuzz targets, without libFuzzer.

Examples:
  # List harnesses
  opfuzz list

  # Replay a crash artifact or a whole corpus directory
  opfuzz replay --op max_pool2d fuzz/artifacts/max_pool2d/crash-1234

  # Sweep every harness with short synthetic inputs
  opfuzz smoke --max-len 128
"#)]
#[command(version)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive)
    #[arg(long, value_name = "FILTER", global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    /// Directory for inputs that trigger unexpected failures
    #[arg(long, value_name = "DIR", global = true)]
    artifact_dir: Option<PathBuf>,

    /// Re-raise panics instead of classifying them
    #[arg(long, global = true)]
    propagate_panics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered harnesses
    #[command(alias = "ls")]
    List(ListCommand),

    /// Run saved inputs through one harness
    Replay(ReplayCommand),

    /// Run every harness on synthetic inputs
    Smoke(SmokeCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Compact,
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, rejected) = load_configuration(&cli)?;
    setup_logging(cli.log_format, cli.log_level.as_deref().unwrap_or(&config.log_filter));
    report_invalid(&rejected);

    let result = match cli.command {
        Commands::List(cmd) => cmd.execute(),
        Commands::Replay(cmd) => cmd.execute(&config),
        Commands::Smoke(cmd) => cmd.execute(&config),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Command failed: {}", e);
            let mut source = e.source();
            while let Some(err) = source {
                error!("  Caused by: {}", err);
                source = err.source();
            }
            std::process::exit(exit::EXIT_GENERIC_FAIL);
        }
    }
}

/// Environment configuration with command-line overrides applied, plus the
/// environment values that were rejected.
fn load_configuration(cli: &Cli) -> Result<(HarnessConfig, Vec<ConfigError>)> {
    let (mut config, rejected) = HarnessConfig::from_env();
    if let Some(dir) = &cli.artifact_dir {
        config.artifact_dir = Some(dir.clone());
    }
    if cli.propagate_panics {
        config.panic_policy = PanicPolicy::Propagate;
    }
    config.validate().context("Invalid harness configuration")?;
    Ok((config, rejected))
}

fn setup_logging(format: LogFormat, level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}
