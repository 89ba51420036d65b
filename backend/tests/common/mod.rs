#![allow(dead_code)]

use std::time::Duration;

use awas::{AppState, config::Config, create_router, store::MemoryStore};
use axum::{
    body::{Body, to_bytes},
    http::Request,
};
use hyper::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

/// Nothing listens on port 9; requests fail fast.
pub const CLOSED: &str = "http://127.0.0.1:9";

pub fn offline_config() -> Config {
    Config {
        provider_timeout: Duration::from_secs(2),
        geocoder_url: CLOSED.to_string(),
        ors_url: CLOSED.to_string(),
        osrm_url: CLOSED.to_string(),
        weather_url: CLOSED.to_string(),
        traffic_url: CLOSED.to_string(),
        news_url: CLOSED.to_string(),
        search_url: CLOSED.to_string(),
        chat_url: CLOSED.to_string(),
        ..Config::default()
    }
}

pub fn app_with(config: &Config) -> axum::Router {
    let state = AppState::with_store(config, Box::new(MemoryStore::new())).expect("state");
    create_router(state)
}

pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// ORS-shaped body for a route along `path` given as `[lon, lat]` pairs.
pub fn ors_body(path: &[[f64; 2]], distance: f64, duration: f64) -> Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": path },
            "properties": { "segments": [{ "distance": distance, "duration": duration }] }
        }]
    })
}

pub fn osrm_body(path: &[[f64; 2]], distance: f64, duration: f64) -> Value {
    serde_json::json!({
        "code": "Ok",
        "routes": [{
            "geometry": { "type": "LineString", "coordinates": path },
            "distance": distance,
            "duration": duration
        }]
    })
}
