use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use pumpmon::store::{DashboardStats, HealthTrends};
use serde_json::{json, Value};

async fn stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.store.dashboard_stats())
}

async fn health_trends(State(state): State<AppState>) -> Json<HealthTrends> {
    Json(state.store.health_trends())
}

async fn recent_activity(State(state): State<AppState>) -> Json<Value> {
    let activities = state.store.recent_activity();
    Json(json!({ "total": activities.len(), "activities": activities }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/health-trends", get(health_trends))
        .route("/dashboard/recent-activity", get(recent_activity))
        .with_state(state)
}
