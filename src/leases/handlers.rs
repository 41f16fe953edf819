use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::http::ApiError;
use crate::leases::{Lease, LeaseRepository};

#[derive(Debug, Serialize, Deserialize)]
pub struct LeasesResponse {
    pub leases: Vec<Lease>,
}

pub async fn leases_index(
    State(repository): State<Arc<dyn LeaseRepository>>,
) -> Result<Json<LeasesResponse>, ApiError> {
    let mut leases = repository.all().map_err(|e| {
        tracing::error!(error = %e, "leases-index: list leases");
        ApiError::internal(format!("list leases: {e}"))
    })?;

    leases.sort_by(|a, b| a.underlay_ip.cmp(&b.underlay_ip));
    tracing::debug!(count = leases.len(), "leases-index: listed leases");

    Ok(Json(LeasesResponse { leases }))
}
