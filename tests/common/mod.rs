#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::Request;
use axum::response::Response;
use grubhub_api::bootstrap::app_context::{AppContext, AppServices};
use grubhub_api::bootstrap::config::Config;
use grubhub_api::infrastructure::db;
use grubhub_api::infrastructure::realtime::DeliverySocketHandler;

/// Nothing listens on port 1, so any ping fails fast.
pub const UNREACHABLE_MONGO: &str = "mongodb://127.0.0.1:1/grubhub_test";

pub async fn context(vars: &[(&str, &str)]) -> AppContext {
    let mut map: HashMap<String, String> = HashMap::new();
    map.insert("MONGO_URI".into(), UNREACHABLE_MONGO.into());
    for (k, v) in vars {
        map.insert(k.to_string(), v.to_string());
    }
    let cfg = Config::from_vars(|k| map.get(k).cloned()).unwrap();
    let database = db::handle(&cfg.mongo_uri, None, Duration::from_millis(200))
        .await
        .unwrap();
    AppContext::new(
        cfg,
        AppServices::new(database, Arc::new(DeliverySocketHandler::default())),
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

pub async fn body_bytes(res: Response) -> Bytes {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_text(res: Response) -> String {
    String::from_utf8(body_bytes(res).await.to_vec()).unwrap()
}

pub async fn body_json(res: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}
