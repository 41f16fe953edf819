//! Diagnostics endpoint served on the loopback debug port.
//!
//! - `GET /log-level` shows the active filter
//! - `POST|PUT /log-level` replaces it (`trace|debug|info|warn|error|fatal`)
//! - `GET /metrics` renders Prometheus text
//! - `GET /healthz` answers `ok`

pub mod handlers;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use self::handlers::*;
use crate::observability::LogLevelHandle;

/// Collaborators the debug endpoints operate on.
#[derive(Clone, Default)]
pub struct DebugState {
    pub log_level: Option<LogLevelHandle>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn setup_debug_router(state: DebugState) -> Router {
    Router::new()
        .route(
            "/log-level",
            get(get_log_level).post(set_log_level).put(set_log_level),
        )
        .route("/metrics", get(get_metrics))
        .route("/healthz", get(get_health))
        .with_state(state)
}
