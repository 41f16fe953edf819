//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor and servers produce:
//!     → logging.rs (structured log events, reloadable level)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout
//!     → debug server (/log-level, /metrics)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{LogLevelHandle, LogLevelError, LoggingError};
