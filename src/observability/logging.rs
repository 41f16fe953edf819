//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level at runtime through the debug server
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level at boot
//! - The level handle is passed to whoever may change it; nothing looks it up globally

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Error type for runtime level changes.
#[derive(Debug, Error)]
pub enum LogLevelError {
    #[error("unknown log level {0:?}")]
    Unknown(String),

    #[error("reload filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Map an operator supplied level name onto a filter directive.
///
/// `fatal` is accepted as an alias for `error`.
pub fn parse_level(level: &str) -> Result<&'static str, LogLevelError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "fatal" => Ok("error"),
        _ => Err(LogLevelError::Unknown(level.trim().to_string())),
    }
}

/// Handle for reading and replacing the active log filter.
#[derive(Clone)]
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl std::fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLevelHandle")
            .field("current", &self.current())
            .finish()
    }
}

impl LogLevelHandle {
    /// The active filter, or `None` once the subscriber is gone.
    pub fn current(&self) -> Option<String> {
        self.handle.with_current(|filter| filter.to_string()).ok()
    }

    /// Replace the active filter with `level`. Returns the applied directive.
    pub fn set(&self, level: &str) -> Result<&'static str, LogLevelError> {
        let directive = parse_level(level)?;
        self.handle.reload(EnvFilter::new(directive))?;
        tracing::info!(level = directive, "log level changed");
        Ok(directive)
    }
}

/// A reloadable filter layer and the handle controlling it.
pub fn reloadable(filter: EnvFilter) -> (reload::Layer<EnvFilter, Registry>, LogLevelHandle) {
    let (layer, handle) = reload::Layer::new(filter);
    (layer, LogLevelHandle { handle })
}

/// Install the global subscriber.
pub fn init(level: &str) -> Result<LogLevelHandle, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };
    let (filter, handle) = reloadable(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(handle)
}
