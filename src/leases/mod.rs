//! Lease listing API.
//!
//! The controller hands out overlay subnets to cells; this module only
//! exposes what has been allocated. Allocation itself lives behind
//! [`LeaseRepository`].

pub mod handlers;

use axum::{routing::get, Router};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::timeout::TimeoutLayer;

use self::handlers::leases_index;

/// An overlay subnet assigned to a cell, keyed by the cell's underlay IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub underlay_ip: String,
    pub overlay_subnet: String,
    pub overlay_hardware_addr: String,
}

/// Error type for lease lookups.
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("lease store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to allocated leases.
pub trait LeaseRepository: Send + Sync + 'static {
    fn all(&self) -> Result<Vec<Lease>, LeaseError>;
}

/// In-process lease table.
#[derive(Debug, Default)]
pub struct MemoryLeases {
    leases: DashMap<String, Lease>,
}

impl MemoryLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the lease held by `lease.underlay_ip`.
    pub fn upsert(&self, lease: Lease) -> Option<Lease> {
        self.leases.insert(lease.underlay_ip.clone(), lease)
    }

    pub fn release(&self, underlay_ip: &str) -> Option<Lease> {
        self.leases.remove(underlay_ip).map(|(_, lease)| lease)
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

impl LeaseRepository for MemoryLeases {
    fn all(&self) -> Result<Vec<Lease>, LeaseError> {
        Ok(self.leases.iter().map(|entry| entry.value().clone()).collect())
    }
}

/// Router for the mutual-TLS API server.
#[allow(deprecated)]
pub fn setup_api_router(repository: Arc<dyn LeaseRepository>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/leases", get(leases_index))
        .with_state(repository)
        .layer(TimeoutLayer::new(request_timeout))
}
