//! Silk controller process supervisor library.

pub mod config;
pub mod debug;
pub mod http;
pub mod leases;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ControllerConfig;
pub use http::HttpServer;
pub use lifecycle::{Group, Member, Runnable, SignalMonitor};
