//! HTTP surface tests
//!
//! Drives the full router with in-memory tables:
//! - envelope shape and pagination echo
//! - filter and sort semantics
//! - identifier rejection before any statement runs
//! - error envelope status codes

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rowgate::config::QueryConfig;
use rowgate::http_server::{HttpServer, HttpServerConfig};
use rowgate::rest_api::DataHandler;
use rowgate::store::{MemoryStore, StoreError};
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

const SEGMENTS: [&str; 3] = ["Online", "Offline", "Corporate"];

/// 25 bookings; every fifth has no price
fn booking_rows() -> Vec<Value> {
    (1..=25)
        .map(|i| {
            let price = if i % 5 == 0 {
                Value::Null
            } else {
                json!(40.0 + (i * 7 % 23) as f64 * 10.0)
            };
            json!({
                "booking_id": format!("INN{:05}", i),
                "booking_status": if i % 3 == 0 { "Canceled" } else { "Not_Canceled" },
                "market_segment": SEGMENTS[i % 3],
                "avg_price_per_room": price,
            })
        })
        .collect()
}

fn setup_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new("public");
    store.add_table(
        "hotel_bookings",
        &[
            ("booking_id", "character varying"),
            ("booking_status", "character varying"),
            ("market_segment", "character varying"),
            ("avg_price_per_room", "numeric"),
        ],
        booking_rows(),
    );
    store.add_table(
        "archived",
        &[("booking_id", "character varying"), ("avg_price_per_room", "numeric")],
        vec![json!({"booking_id": "OLD1", "avg_price_per_room": null})],
    );
    store.add_table(
        "codes",
        &[("code", "integer")],
        (0..150).rev().map(|i| json!({ "code": i })).collect(),
    );
    Arc::new(store)
}

fn router_for(store: Arc<MemoryStore>) -> Router {
    let handler = Arc::new(DataHandler::new(store, "public", &QueryConfig::default()));
    HttpServer::new(HttpServerConfig::default(), handler).router()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn prices(body: &Value) -> Vec<Option<f64>> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["avg_price_per_room"].as_f64())
        .collect()
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_tables_listed_alphabetically() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/tables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"table_name": "archived"},
            {"table_name": "codes"},
            {"table_name": "hotel_bookings"}
        ])
    );
}

#[tokio::test]
async fn test_columns_in_physical_order() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/tables/hotel_bookings/columns").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], json!({"column_name": "booking_id", "data_type": "character varying"}));
    assert_eq!(body[3]["column_name"], "avg_price_per_room");
}

#[tokio::test]
async fn test_unknown_table_is_404() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/tables/ghosts/columns").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Failed to fetch columns");
    assert!(body["details"].as_str().unwrap().contains("ghosts"));
}

// =============================================================================
// Data Pages
// =============================================================================

#[tokio::test]
async fn test_defaults_echoed_in_envelope() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["total"], 25);
    assert_eq!(body["data"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_limit_caps_rows_but_not_total() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings?limit=10&offset=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["total"], 25);
    assert_eq!(body["limit"], 10);
}

#[tokio::test]
async fn test_offset_past_end() {
    let router = router_for(setup_store());
    let (_, body) = get(&router, "/api/data/hotel_bookings?limit=10&offset=40").await;

    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 25);
    assert_eq!(body["offset"], 40);
}

#[tokio::test]
async fn test_contradictory_price_range_is_empty() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings?min_price=100&max_price=50").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let router = router_for(setup_store());
    let (_, body) = get(
        &router,
        "/api/data/hotel_bookings?booking_status=Canceled&market_segment=Online&min_price=0",
    )
    .await;

    let rows = body["data"].as_array().unwrap();
    assert!(!rows.is_empty());
    assert_eq!(body["total"], rows.len());
    for row in rows {
        assert_eq!(row["booking_status"], "Canceled");
        assert_eq!(row["market_segment"], "Online");
        assert!(row["avg_price_per_room"].is_number());
    }
}

#[tokio::test]
async fn test_sort_descending_is_non_increasing() {
    let router = router_for(setup_store());
    let (status, body) = get(
        &router,
        "/api/data/hotel_bookings?sort_by=avg_price_per_room&sort_order=DESC&min_price=0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = prices(&body).into_iter().map(Option::unwrap).collect();
    assert_eq!(prices.len(), 20);
    assert!(prices.windows(2).all(|w| w[0] >= w[1]), "{prices:?}");
}

#[tokio::test]
async fn test_sort_ascending_by_default() {
    let router = router_for(setup_store());
    let (_, body) = get(&router, "/api/data/hotel_bookings?sort_by=booking_id&limit=3").await;

    let ids: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["booking_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["INN00001", "INN00002", "INN00003"]);
}

#[tokio::test]
async fn test_unsorted_page_is_subset_of_table() {
    let router = router_for(setup_store());
    let (_, body) = get(&router, "/api/data/hotel_bookings?market_segment=Offline").await;

    let expected: Vec<Value> = booking_rows()
        .into_iter()
        .filter(|r| r["market_segment"] == "Offline")
        .collect();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), expected.len());
    for row in rows {
        assert!(expected.contains(row));
    }
}

#[tokio::test]
async fn test_unrecognized_keys_ignored() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings?room_type=Suite&foo=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 25);
}

#[tokio::test]
async fn test_status_filter_on_integer_column() {
    let store = MemoryStore::new("public");
    store.add_table(
        "coded_bookings",
        &[("booking_id", "text"), ("booking_status", "integer")],
        vec![
            json!({"booking_id": "C1", "booking_status": 1}),
            json!({"booking_id": "C2", "booking_status": 0}),
            json!({"booking_id": "C3", "booking_status": 1}),
        ],
    );
    let store = Arc::new(store);
    let router = router_for(store.clone());

    let (status, body) = get(&router, "/api/data/coded_bookings?booking_status=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert!(store
        .executed()
        .iter()
        .all(|sql| sql.contains("\"booking_status\"::text = $1")));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_malformed_table_rejected_before_any_statement() {
    let store = setup_store();
    let router = router_for(store.clone());

    let (status, body) = get(&router, "/api/data/hotel_bookings%3BDROP%20TABLE%20codes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to fetch data");
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_malicious_sort_column_rejected_before_any_statement() {
    let store = setup_store();
    let router = router_for(store.clone());

    let (status, _) = get(
        &router,
        "/api/data/hotel_bookings?sort_by=booking_id%3B%20DELETE%20FROM%20codes",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, "/api/data/hotel_bookings?sort_by=room_type").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        &router,
        "/api/data/hotel_bookings?sort_by=booking_id&sort_order=DESC%2C%20(SELECT%201)",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_non_numeric_price_is_400() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings?min_price=cheap").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("min_price"));
}

#[tokio::test]
async fn test_bad_limit_is_400() {
    let router = router_for(setup_store());

    let (status, _) = get(&router, "/api/data/hotel_bookings?limit=ten").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, "/api/data/hotel_bookings?limit=100000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filter_on_table_without_column_is_400() {
    let router = router_for(setup_store());
    let (status, _) = get(&router, "/api/data/codes?booking_status=Canceled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Distinct & Stats
// =============================================================================

#[tokio::test]
async fn test_distinct_values_sorted() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/data/hotel_bookings/distinct/market_segment").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Corporate", "Offline", "Online"]));
}

#[tokio::test]
async fn test_distinct_values_capped_at_100() {
    let router = router_for(setup_store());
    let (_, body) = get(&router, "/api/data/codes/distinct/code").await;

    let values = body.as_array().unwrap();
    assert_eq!(values.len(), 100);
    assert_eq!(values[0], 0);
    assert_eq!(values[99], 99);
}

#[tokio::test]
async fn test_distinct_excludes_nulls() {
    let router = router_for(setup_store());
    let (_, body) = get(&router, "/api/data/archived/distinct/avg_price_per_room").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_distinct_unknown_column_is_404() {
    let router = router_for(setup_store());
    let (status, _) = get(&router, "/api/data/hotel_bookings/distinct/room_type").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/stats/hotel_bookings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_records"], 20);
    let min = body["min_price"].as_f64().unwrap();
    let max = body["max_price"].as_f64().unwrap();
    let avg = body["avg_price"].as_f64().unwrap();
    assert!(min <= avg && avg <= max);
}

#[tokio::test]
async fn test_stats_without_qualifying_rows_are_null() {
    let router = router_for(setup_store());
    let (status, body) = get(&router, "/api/stats/archived").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"total_records": 0, "avg_price": null, "min_price": null, "max_price": null})
    );
}

#[tokio::test]
async fn test_stats_on_table_without_price_is_400() {
    let router = router_for(setup_store());
    let (status, _) = get(&router, "/api/stats/codes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Failures & Health
// =============================================================================

#[tokio::test]
async fn test_execution_failure_is_500_with_details() {
    let store = MemoryStore::new("public")
        .failing(StoreError::Database("canceling statement due to statement timeout".to_string()));
    store.add_table("hotel_bookings", &[("booking_id", "text")], vec![]);
    let router = router_for(Arc::new(store));

    let (status, body) = get(&router, "/api/data/hotel_bookings").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch data");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("canceling statement"));
}

#[tokio::test]
async fn test_health() {
    let store = setup_store();
    let router = router_for(store.clone());

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    rowgate::store::DataStore::close(store.as_ref()).await;
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}
