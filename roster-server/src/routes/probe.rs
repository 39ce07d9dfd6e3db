//! Store connectivity probe

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::server::AppState;

/// Probe response
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub message: &'static str,
    pub count: usize,
}

/// GET /test - count the probe collection to prove the store is reachable
async fn probe(State(state): State<Arc<AppState>>) -> Result<Json<ProbeResponse>, ApiError> {
    let count = state
        .probe
        .count()
        .await
        .map_err(ApiError::store("Error in test query"))?;

    Ok(Json(ProbeResponse {
        message: "Test query successful",
        count,
    }))
}

/// Probe routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/test", get(probe))
}
