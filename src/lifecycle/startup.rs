//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the mutual-TLS context from configured certificate paths
//! - Construct the API and debug server adapters
//! - Assemble them into the ordered controller group under a signal monitor
//!
//! # Design Decisions
//! - Fail fast: TLS and address errors surface before any server starts
//! - The API server starts first; the debug server assumes it is up
//! - Collaborators (lease store, log handle, metrics) are injected

use axum_server::tls_rustls::RustlsConfig;
use std::net::AddrParseError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::debug::{setup_debug_router, DebugState};
use crate::http::HttpServer;
use crate::leases::{setup_api_router, LeaseRepository};
use crate::lifecycle::{Group, Member, SignalMonitor};
use crate::net::tls::{mutual_tls_config, TlsError};

/// Member name of the mutual-TLS API server.
pub const HTTP_SERVER: &str = "http_server";
/// Member name of the debug server.
pub const DEBUG_SERVER: &str = "debug-server";

/// Error type for assembling the process group.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("mutual tls config: {0}")]
    Tls(#[from] TlsError),

    #[error("listen address: {0}")]
    Address(#[from] AddrParseError),
}

/// Everything the controller group needs besides its configuration.
pub struct Collaborators {
    pub leases: Arc<dyn LeaseRepository>,
    pub debug: DebugState,
}

/// Build the TLS context described by `config`.
pub fn controller_tls(config: &ControllerConfig) -> Result<RustlsConfig, TlsError> {
    mutual_tls_config(
        Path::new(&config.server_cert_file),
        Path::new(&config.server_key_file),
        Path::new(&config.ca_cert_file),
    )
}

/// The ordered group `[http_server, debug-server]`.
pub fn controller_group(
    config: &ControllerConfig,
    tls: RustlsConfig,
    collaborators: Collaborators,
) -> Result<Group, StartupError> {
    let api = HttpServer::new(
        HTTP_SERVER,
        config.listen_address()?,
        setup_api_router(collaborators.leases, config.request_timeout()),
    )
    .with_tls(tls)
    .drain_timeout(config.drain_timeout());

    let debug = HttpServer::new(
        DEBUG_SERVER,
        config.debug_address(),
        setup_debug_router(collaborators.debug),
    )
    .drain_timeout(config.drain_timeout());

    Ok(Group::ordered(
        "silk-controller",
        vec![Member::new(HTTP_SERVER, api), Member::new(DEBUG_SERVER, debug)],
    ))
}

/// Wrap `group` so SIGINT/SIGTERM stop it, honouring the configured deadline.
pub fn monitor(config: &ControllerConfig, group: Group) -> SignalMonitor {
    let monitor = SignalMonitor::new(group);
    match config.shutdown_deadline() {
        Some(deadline) => monitor.shutdown_deadline(deadline),
        None => monitor,
    }
}
