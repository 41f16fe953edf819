//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Root configuration for the controller process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Host the mutual-TLS API listens on (IP literal).
    pub listen_host: String,

    /// Port the mutual-TLS API listens on.
    pub listen_port: u16,

    /// Loopback port of the debug server.
    pub debug_server_port: u16,

    /// CA bundle client certificates must chain to (PEM).
    pub ca_cert_file: String,

    /// Server certificate chain (PEM).
    pub server_cert_file: String,

    /// Server private key (PEM).
    pub server_key_file: String,

    /// Grace period for in-flight requests once a server is stopping.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Per-request timeout on the API server.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on the whole shutdown. Unbounded when absent.
    #[serde(default)]
    pub shutdown_deadline_secs: Option<u64>,

    /// Initial log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the Prometheus recorder served on the debug server.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_drain_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl ControllerConfig {
    /// Address of the mutual-TLS API server.
    pub fn listen_address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let host: IpAddr = self.listen_host.parse()?;
        Ok(SocketAddr::new(host, self.listen_port))
    }

    /// Address of the debug server; always loopback.
    pub fn debug_address(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.debug_server_port)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_deadline(&self) -> Option<Duration> {
        self.shutdown_deadline_secs.map(Duration::from_secs)
    }
}
