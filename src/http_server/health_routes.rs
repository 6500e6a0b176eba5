//! Health check route

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::rest_api::DataHandler;
use crate::store::DataStore;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /health`
pub fn health_routes<S: DataStore + 'static>(state: Arc<DataHandler<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<S>))
        .with_state(state)
}

/// 200 when the database answers, 503 otherwise
async fn health_handler<S: DataStore + 'static>(
    State(state): State<Arc<DataHandler<S>>>,
) -> impl IntoResponse {
    let (status, label) = if state.is_healthy().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let response = HealthResponse {
        status: label.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status, Json(response))
}
