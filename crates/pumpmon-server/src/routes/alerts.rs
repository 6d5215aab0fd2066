use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use pumpmon::store::{Alert, AlertFilter, AlertStatus, AlertSummary};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct EnrichedAlert {
    #[serde(flatten)]
    alert: Alert,
    pump_name: String,
    pump_location: String,
}

async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Json<Value> {
    let alerts: Vec<EnrichedAlert> = state
        .store
        .list_alerts(&filter)
        .into_iter()
        .map(|alert| {
            let pump = state.store.find_pump(&alert.pump_id);
            EnrichedAlert {
                pump_name: pump.as_ref().map_or("Unknown".into(), |p| p.name.clone()),
                pump_location: pump.as_ref().map_or("Unknown".into(), |p| p.location.clone()),
                alert,
            }
        })
        .collect();

    Json(json!({
        "total": alerts.len(),
        "alerts": alerts,
        "filters": {
            "status": filter.status,
            "priority": filter.priority,
            "pump_id": filter.pump_id,
        }
    }))
}

async fn summary(State(state): State<AppState>) -> Json<AlertSummary> {
    Json(state.store.alert_summary())
}

/// Nothing is persisted; the store is a fixed snapshot
fn transition(
    state: &AppState,
    alert_id: u32,
    status: AlertStatus,
    verb: &str,
) -> Result<Json<Value>, ApiError> {
    if state.store.find_alert(alert_id).is_none() {
        return Err(ApiError::NotFound(format!("Alert {alert_id} not found")));
    }
    tracing::info!(alert_id, status = status.as_str(), "alert {}", verb);
    Ok(Json(json!({
        "message": format!("Alert {alert_id} {verb} successfully"),
        "alert_id": alert_id,
        "status": status.as_str(),
    })))
}

async fn acknowledge(
    State(state): State<AppState>,
    Path(alert_id): Path<u32>,
) -> Result<Json<Value>, ApiError> {
    transition(&state, alert_id, AlertStatus::Acknowledged, "acknowledged")
}

async fn resolve(
    State(state): State<AppState>,
    Path(alert_id): Path<u32>,
) -> Result<Json<Value>, ApiError> {
    transition(&state, alert_id, AlertStatus::Resolved, "resolved")
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/alerts/", get(list_alerts))
        .route("/alerts/summary", get(summary))
        .route("/alerts/:alert_id/acknowledge", put(acknowledge))
        .route("/alerts/:alert_id/resolve", put(resolve))
        .with_state(state)
}
