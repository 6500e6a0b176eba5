//! Database HTTP Routes
//!
//! Catalog, data, distinct-value and stats endpoints, mounted under `/api`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{ColumnInfo, TableInfo};
use crate::observability::{Event, Logger};
use crate::rest_api::{DataHandler, RestError, ResultEnvelope, TableStats};
use crate::store::DataStore;

use super::errors::ApiError;

/// Shared state type
type DatabaseState<S> = Arc<DataHandler<S>>;

/// Create database routes
pub fn database_routes<S: DataStore + 'static>(state: DatabaseState<S>) -> Router {
    Router::new()
        .route("/tables", get(list_tables_handler::<S>))
        .route("/tables/:table_name/columns", get(list_columns_handler::<S>))
        .route("/data/:table_name", get(table_data_handler::<S>))
        .route(
            "/data/:table_name/distinct/:column_name",
            get(distinct_values_handler::<S>),
        )
        .route("/stats/:table_name", get(stats_handler::<S>))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Log a failed request and convert it into the error envelope
fn reject(route: &str, request_id: Uuid, err: RestError, summary: &str) -> ApiError {
    let request_id = request_id.to_string();
    let reason = err.to_string();
    let status = err.status_code().as_u16().to_string();
    let fields = [
        ("reason", reason.as_str()),
        ("request_id", request_id.as_str()),
        ("route", route),
        ("status", status.as_str()),
    ];

    if err.is_client_error() {
        Logger::warn(Event::RequestRejected.as_str(), &fields);
    } else {
        Logger::error(Event::RequestFailed.as_str(), &fields);
    }

    ApiError::from_rest(err, summary)
}

// ==================
// Catalog Handlers
// ==================

async fn list_tables_handler<S: DataStore + 'static>(
    State(state): State<DatabaseState<S>>,
) -> Result<Json<Vec<TableInfo>>, ApiError> {
    state
        .list_tables()
        .await
        .map(Json)
        .map_err(|e| reject("tables", Uuid::new_v4(), e, "Failed to fetch tables"))
}

async fn list_columns_handler<S: DataStore + 'static>(
    State(state): State<DatabaseState<S>>,
    Path(table_name): Path<String>,
) -> Result<Json<Vec<ColumnInfo>>, ApiError> {
    state
        .list_columns(&table_name)
        .await
        .map(Json)
        .map_err(|e| reject("columns", Uuid::new_v4(), e, "Failed to fetch columns"))
}

// ==================
// Data Handlers
// ==================

async fn table_data_handler<S: DataStore + 'static>(
    State(state): State<DatabaseState<S>>,
    Path(table_name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let envelope = state
        .fetch_page(&table_name, &query)
        .await
        .map_err(|e| reject("data", request_id, e, "Failed to fetch data"))?;

    let request_id = request_id.to_string();
    let rows = envelope.data.len().to_string();
    let total = envelope.total.to_string();
    let elapsed_ms = started.elapsed().as_millis().to_string();
    Logger::info(
        Event::QueryExecuted.as_str(),
        &[
            ("elapsed_ms", elapsed_ms.as_str()),
            ("request_id", request_id.as_str()),
            ("rows", rows.as_str()),
            ("table", table_name.as_str()),
            ("total", total.as_str()),
        ],
    );

    Ok(Json(envelope))
}

async fn distinct_values_handler<S: DataStore + 'static>(
    State(state): State<DatabaseState<S>>,
    Path((table_name, column_name)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>, ApiError> {
    state
        .distinct_values(&table_name, &column_name)
        .await
        .map(Json)
        .map_err(|e| {
            reject(
                "distinct",
                Uuid::new_v4(),
                e,
                "Failed to fetch distinct values",
            )
        })
}

// ==================
// Statistics
// ==================

async fn stats_handler<S: DataStore + 'static>(
    State(state): State<DatabaseState<S>>,
    Path(table_name): Path<String>,
) -> Result<Json<TableStats>, ApiError> {
    state
        .stats(&table_name)
        .await
        .map(Json)
        .map_err(|e| reject("stats", Uuid::new_v4(), e, "Failed to fetch statistics"))
}
