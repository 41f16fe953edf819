//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (axum-server)
//!     → server.rs (bind, readiness, graceful drain)
//!     → request.rs (request ID, request metrics)
//!     → handler router (leases API or debug endpoints)
//!     → response.rs (JSON error bodies)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ErrorBody};
pub use server::HttpServer;
