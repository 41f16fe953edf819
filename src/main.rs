//! Silk controller (v1)
//!
//! Serves the lease API over mutual TLS plus a loopback debug server, run
//! as one supervised unit.
//!
//! # Architecture Overview
//!
//! ```text
//!   --config-file ─▶ config ─▶ TLS context ─┐
//!                                           ▼
//!   ┌────────────────── SignalMonitor (SIGINT/SIGTERM) ───────────────────┐
//!   │  ┌──────────────────────── Group (ordered) ──────────────────────┐  │
//!   │  │  1. http_server  (mTLS, /leases)                              │  │
//!   │  │  2. debug-server (127.0.0.1, /log-level /metrics /healthz)    │  │
//!   │  └───────────────────────────────────────────────────────────────┘  │
//!   └─────────────────────────────────────────────────────────────────────┘
//!        startup 1 → 2, shutdown 2 → 1, first failure is the exit reason
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use silk_controller::config::{load_config, ConfigError};
use silk_controller::debug::DebugState;
use silk_controller::leases::MemoryLeases;
use silk_controller::lifecycle::startup::{self, Collaborators, StartupError};
use silk_controller::lifecycle::{invoke, RunError};
use silk_controller::observability::{logging, metrics, LogLevelError, LogLevelHandle};

#[derive(Parser)]
#[command(name = "silk-controller")]
#[command(about = "Overlay network lease controller", long_about = None)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long = "config-file")]
    config_file: PathBuf,
}

#[derive(Debug, Error)]
enum ControllerError {
    #[error("loading config: {0}")]
    Config(#[from] ConfigError),

    #[error("log level: {0}")]
    LogLevel(#[from] LogLevelError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("wait returned error: {0}")]
    Run(#[from] RunError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match logging::init("info") {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("silk-controller error: {err}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("starting");

    match run(cli, log_level).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("silk-controller error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, log_level: LogLevelHandle) -> Result<(), ControllerError> {
    let config = load_config(&cli.config_file)?;
    if std::env::var_os("RUST_LOG").is_none() {
        log_level.set(&config.log_level)?;
    }

    tracing::info!(
        config_file = %cli.config_file.display(),
        listen_host = %config.listen_host,
        listen_port = config.listen_port,
        debug_server_port = config.debug_server_port,
        "configuration loaded"
    );

    let prometheus = if config.metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "metrics recorder not installed");
                None
            }
        }
    } else {
        None
    };

    let tls = startup::controller_tls(&config).map_err(StartupError::from)?;
    let group = startup::controller_group(
        &config,
        tls,
        Collaborators {
            leases: Arc::new(MemoryLeases::new()),
            debug: DebugState {
                log_level: Some(log_level),
                metrics: prometheus,
            },
        },
    )?;

    let process = invoke(startup::monitor(&config, group)).await?;
    if process.became_ready() {
        tracing::info!("started");
    } else {
        tracing::info!("stopped before startup completed");
    }

    process.wait().await?;

    tracing::info!("exited");
    Ok(())
}
