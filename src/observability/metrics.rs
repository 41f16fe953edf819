//! Metrics collection and exposition.
//!
//! # Metrics
//! - `supervisor_member_transitions_total` (counter): member state changes by group, member, state
//! - `supervisor_members_ready` (gauge): ready members per group
//! - `http_requests_total` (counter): requests by server and status
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a recorder is installed
//! - The Prometheus recorder is installed by the binary; the debug server renders it

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::lifecycle::MemberState;

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn record_member_transition(group: &str, member: &str, state: MemberState) {
    counter!(
        "supervisor_member_transitions_total",
        "group" => group.to_string(),
        "member" => member.to_string(),
        "state" => state.as_label()
    )
    .increment(1);
}

pub fn set_members_ready(group: &str, ready: usize) {
    gauge!("supervisor_members_ready", "group" => group.to_string()).set(ready as f64);
}

pub fn record_request(server: &'static str, status: u16) {
    counter!(
        "http_requests_total",
        "server" => server,
        "status" => status.to_string()
    )
    .increment(1);
}
