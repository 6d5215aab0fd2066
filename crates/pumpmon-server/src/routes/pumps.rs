use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use pumpmon::store::{Pump, PumpFilter};
use serde_json::{json, Value};

fn require_pump(state: &AppState, pump_id: &str) -> Result<Pump, ApiError> {
    state
        .store
        .find_pump(pump_id)
        .ok_or_else(|| ApiError::NotFound(format!("Pump {pump_id} not found")))
}

async fn list_pumps(State(state): State<AppState>) -> Json<Value> {
    let pumps = state.store.pumps();
    Json(json!({ "pumps": pumps, "total": pumps.len() }))
}

async fn pump_details(
    State(state): State<AppState>,
    Path(pump_id): Path<String>,
) -> Result<Json<Pump>, ApiError> {
    require_pump(&state, &pump_id).map(Json)
}

async fn pump_maintenance(
    State(state): State<AppState>,
    Path(pump_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_pump(&state, &pump_id)?;
    let logs = state.store.maintenance_logs(&pump_id);
    Ok(Json(json!({
        "pump_id": pump_id,
        "count": logs.len(),
        "maintenance_logs": logs,
    })))
}

async fn pump_trends(
    State(state): State<AppState>,
    Path(pump_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_pump(&state, &pump_id)?;
    let samples = state.store.sensor_trend(&pump_id);
    Ok(Json(json!({
        "pump_id": pump_id,
        "data_points": samples.len(),
        "sensor_data": samples,
    })))
}

async fn search_pumps(
    State(state): State<AppState>,
    Query(filter): Query<PumpFilter>,
) -> Json<Value> {
    let pumps = state.store.search_pumps(&filter);
    Json(json!({
        "total": pumps.len(),
        "pumps": pumps,
        "filters": {
            "location": filter.location,
            "pump_type": filter.pump_type,
            "status": filter.status,
        }
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/pumps/", get(list_pumps))
        .route("/pumps/search/", get(search_pumps))
        .route("/pumps/:pump_id", get(pump_details))
        .route("/pumps/:pump_id/maintenance", get(pump_maintenance))
        .route("/pumps/:pump_id/trends", get(pump_trends))
        .with_state(state)
}
