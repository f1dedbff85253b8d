//! Flightfeed - Feeder to message bus relay
//!
//! # Usage
//!
//! ```bash
//! # Relay the local feeder (default)
//! flightfeed
//! flightfeed --config configs/config.toml
//! flightfeed serve --host 192.168.1.20:10001 --project my-project --topic adsb
//!
//! # Dry run: print the JSON for a captured feed
//! flightfeed convert capture.tsv
//! ```

mod cmd;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightfeed_config::{Config, LogFormat, LogLevel};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Config files tried in order when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/config.toml", "config.toml"];

/// Flightfeed - Relay feeder position lines to a message bus
#[derive(Parser, Debug)]
#[command(name = "flightfeed")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Relay the feeder to the configured sink (default)
    Serve(cmd::serve::ServeArgs),

    /// Convert a captured feed to JSON lines on stdout
    Convert(cmd::convert::ConvertArgs),
}

/// Configuration plus the file it came from
struct LoadedConfig {
    config: Config,
    path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref());
    let level = resolve_log_level(
        cli.log_level.as_deref(),
        loaded.as_ref().ok().map(|l| &l.config),
    );
    let format = loaded
        .as_ref()
        .map(|l| l.config.log.format)
        .unwrap_or_default();

    if let Err(e) = init_logging(&level, format) {
        eprintln!("flightfeed: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match loaded {
        Ok(loaded) => dispatch(cli.command, loaded).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "flightfeed failed");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Option<Command>, loaded: LoadedConfig) -> Result<ExitCode> {
    match &loaded.path {
        Some(path) => info!(config = %path.display(), "using config file"),
        None => info!("no config file found, using defaults"),
    }

    match command {
        Some(Command::Serve(args)) => cmd::serve::run(args, loaded.config).await,
        Some(Command::Convert(args)) => cmd::convert::run(args, &loaded.config).await,
        // No subcommand = relay (default behavior)
        None => cmd::serve::run(cmd::serve::ServeArgs::default(), loaded.config).await,
    }
}

/// Load the explicit config file, else the first default path, else defaults
fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        // User explicitly provided config path - must exist
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let config = Config::from_file(path).context("failed to load configuration")?;
        return Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
        });
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            let config = Config::from_file(path).context("failed to load configuration")?;
            return Ok(LoadedConfig {
                config,
                path: Some(path.to_path_buf()),
            });
        }
    }

    Ok(LoadedConfig {
        config: Config::default(),
        path: None,
    })
}

/// Resolve the filter directive: CLI flag > config file > default level
///
/// The CLI value is used verbatim, so a full directive such as
/// `flightfeed_pipeline=trace` works there.
fn resolve_log_level(cli_level: Option<&str>, config: Option<&Config>) -> String {
    if let Some(level) = cli_level {
        return level.to_string();
    }

    config
        .map_or(LogLevel::default(), |config| config.log.level)
        .directive()
}

/// Initialize the tracing subscriber; logs go to stderr
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.context("failed to initialize logging")
}
