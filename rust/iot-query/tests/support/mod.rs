#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{self, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use iot_query::{
    config::{AppConfig, StoreConfig},
    models::{AssetNode, TelemetryReading},
    query::QueryRequest,
    server::Server,
    store::{MemoryStore, Stores},
};
use serde_json::{json, Value};
use std::{sync::Once, time::Duration as StdDuration};
use tower::ServiceExt;

static TRACING_INIT: Once = Once::new();

pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

pub fn test_config() -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".parse().expect("loopback address"),
        http_addr: None,
        store: StoreConfig::Fixture("tests/fixture.json".into()),
        request_timeout: StdDuration::from_secs(10),
    }
}

/// Two fridges and a dishwasher, as hierarchy documents.
pub fn home_assets() -> Vec<Value> {
    vec![
        device_doc(
            "fridge-1",
            "Smart Fridge A",
            &[("fridge-1-moist", "Moisture Sensor"), ("fridge-1-amp", "Ammeter")],
        ),
        device_doc(
            "fridge-2",
            "Smart Fridge B",
            &[("fridge-2-moist", "moisture meter"), ("fridge-2-amp", "ACS712 Ammeter")],
        ),
        device_doc(
            "dishwasher-1",
            "Smart Dishwasher",
            &[("dw-flow", "Water Flow Sensor"), ("dw-amp", "Ammeter")],
        ),
        json!({ "assetUid": "orphan", "customAttributes": { "name": "Untyped thing" } }),
    ]
}

pub fn device_doc(uid: &str, name: &str, sensors: &[(&str, &str)]) -> Value {
    let sensors: Vec<Value> = sensors
        .iter()
        .map(|(uid, name)| {
            json!({ "assetUid": uid, "customAttributes": { "type": "SENSOR", "name": name } })
        })
        .collect();
    json!({
        "assetUid": uid,
        "customAttributes": {
            "type": "DEVICE",
            "name": name,
            "children": [{
                "assetUid": format!("{uid}-board"),
                "customAttributes": { "type": "BOARD", "name": "Main board", "children": sensors }
            }]
        }
    })
}

/// `(parent uid, age, payload fields)` relative to `now`.
pub fn home_readings(now: DateTime<Utc>) -> Vec<(String, DateTime<Utc>, Value)> {
    let rows = [
        ("fridge-1", Duration::hours(1), json!({"Moisture Sensor": 40.0, "Ammeter": 1.5})),
        ("fridge-1", Duration::hours(2), json!({"Moisture Sensor": "50", "Ammeter": 2.5})),
        ("fridge-1", Duration::hours(6), json!({"Moisture Sensor": 99.0, "Ammeter": 3.0})),
        ("fridge-2", Duration::minutes(30), json!({"moisture meter": "N/A", "ACS712 Ammeter": 4.0})),
        ("dishwasher-1", Duration::days(3), json!({"Water Flow Sensor": 11.0, "Ammeter": 6.0})),
        ("dishwasher-1", Duration::days(1), json!({"Water Flow Sensor": 13.0, "Ammeter": "6.5"})),
    ];
    rows.into_iter()
        .map(|(uid, age, mut payload)| {
            payload["parent_asset_uid"] = json!(uid);
            (uid.to_string(), now - age, payload)
        })
        .collect()
}

pub fn home_store(now: DateTime<Utc>) -> MemoryStore {
    let assets = home_assets().iter().map(AssetNode::from).collect();
    let readings = home_readings(now)
        .into_iter()
        .filter_map(|(_, ts, payload)| TelemetryReading::from_payload(ts, payload))
        .collect();
    MemoryStore::new(assets, readings)
}

pub fn server_with(store: MemoryStore) -> Server {
    init_tracing();
    Server::with_stores(test_config(), Stores::from_backend(store))
}

pub async fn post_query(router: &Router, query: &str) -> http::Response<Body> {
    let payload = QueryRequest {
        query: query.to_string(),
    };
    let body = serde_json::to_vec(&payload).expect("request payload should serialize");
    let request = Request::builder()
        .method("POST")
        .uri("/api/query")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("failed to build query request");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should handle query request")
}

pub async fn read_json(response: http::Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let value =
        serde_json::from_slice::<Value>(&bytes).expect("response body should be valid JSON");
    (status, value)
}
