//! Siphon - Syslog ingestion proxy
//!
//! Accepts syslog over UDP and TCP, parses each record into a normalized
//! event, and forwards batched events to the configured sink.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: TCP on :601, UDP on :514, NDJSON to stdout
//! siphon
//!
//! # Custom listen addresses
//! siphon --addr-tcp :1601 --addr-udp :1514
//!
//! # With a config file
//! siphon --config configs/siphon.toml
//! ```
//!
//! Quick CLI test:
//!
//! ```bash
//! echo -n "udp message" | nc -u -w1 localhost 514
//! echo "tcp message" | nc -w1 localhost 601
//! ```

mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use siphon_config::{Config, LogFormat};

/// Syslog ingestion proxy
#[derive(Parser, Debug)]
#[command(name = "siphon")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TCP listen address, <ip>:<port> (overrides the config file)
    #[arg(long, value_name = "ADDR")]
    addr_tcp: Option<String>,

    /// UDP listen address, <ip>:<port> (overrides the config file)
    #[arg(long, value_name = "ADDR")]
    addr_udp: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("siphon: configuration error: {err:#}");
            return ExitCode::from(1);
        }
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.level.as_str());
    if let Err(err) = init_logging(level, config.log.format) {
        eprintln!("siphon: configuration error: {err:#}");
        return ExitCode::from(1);
    }

    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "server failed");
            ExitCode::from(2)
        }
    }
}

/// Load the config file (or defaults) and apply CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Config::from_file(path).context("failed to load configuration")?
        }
        None => {
            // No config provided: try the default paths, fall back to
            // built-in defaults.
            let default_paths = [
                PathBuf::from("configs/siphon.toml"),
                PathBuf::from("siphon.toml"),
            ];

            let mut loaded = None;
            for path in &default_paths {
                if path.exists() {
                    loaded =
                        Some(Config::from_file(path).context("failed to load configuration")?);
                    break;
                }
            }
            loaded.unwrap_or_default()
        }
    };

    if let Some(addr) = &cli.addr_tcp {
        config.listeners.addr_tcp = addr.clone();
    }
    if let Some(addr) = &cli.addr_udp {
        config.listeners.addr_udp = addr.clone();
    }

    config.validate().context("invalid configuration")?;

    Ok(config)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| anyhow::anyhow!("invalid log level: {err}"))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    Ok(())
}
