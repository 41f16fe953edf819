//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, path from --config-file)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → ControllerConfig (validated, immutable)
//!     → consumed once by the bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Listener and certificate fields are required, tuning knobs have defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ControllerConfig;
pub use validation::{validate_config, ValidationError};
