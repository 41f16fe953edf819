//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! PEM files (server cert, key, CA bundle)
//!     → tls.rs (parse, build client verifier + server config)
//!     → RustlsConfig handed to the API server adapter
//! ```
//!
//! # Design Decisions
//! - Client certificates are mandatory on the API listener
//! - TLS context is built once at boot; failures are fatal before any server starts

pub mod tls;

pub use tls::{mutual_tls_config, TlsError};
