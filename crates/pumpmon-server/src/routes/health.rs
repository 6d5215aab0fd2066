use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use super::API_PREFIX;

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Pump Monitor API",
        "version": env!("CARGO_PKG_VERSION"),
        "api_prefix": API_PREFIX,
        "data_source": "mock_data"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pump-monitor-api",
        "data_source": "mock_data"
    }))
}

pub fn routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}
