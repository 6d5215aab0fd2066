use serde_json::{json, Value};

use super::{str_arg, to_value, Arguments, Executor};
use crate::errors::AgentResult;
use crate::models::tool::{ParameterSchema, ParameterType, Tool};
use crate::store::{DataStore, PumpFilter};

pub(super) fn entries() -> Vec<(Tool, Executor)> {
    vec![
        (
            Tool::new(
                "get_pump_details",
                "Get detailed information about a specific pump including sensors, AI insights, and operational data",
                ParameterSchema::empty().required(
                    "pump_id",
                    ParameterType::String,
                    "The pump ID (e.g., 'P001', 'P002')",
                ),
            ),
            pump_details as Executor,
        ),
        (
            Tool::new(
                "get_all_pumps",
                "Get list of all pumps with their current status and key metrics",
                ParameterSchema::empty(),
            ),
            all_pumps as Executor,
        ),
        (
            Tool::new(
                "get_pump_maintenance",
                "Get maintenance history for a specific pump",
                ParameterSchema::empty().required(
                    "pump_id",
                    ParameterType::String,
                    "The pump ID for which to get maintenance history",
                ),
            ),
            pump_maintenance as Executor,
        ),
        (
            Tool::new(
                "get_pump_trends",
                "Get sensor data trends for a specific pump over the last 24 hours",
                ParameterSchema::empty().required(
                    "pump_id",
                    ParameterType::String,
                    "The pump ID for which to get trend data",
                ),
            ),
            pump_trends as Executor,
        ),
        (
            Tool::new(
                "search_pumps",
                "Search pumps by location, type, status, or other criteria",
                ParameterSchema::empty()
                    .optional(
                        "location",
                        ParameterType::String,
                        "Filter by location (e.g., 'Unit A', 'Unit B')",
                    )
                    .optional(
                        "pump_type",
                        ParameterType::String,
                        "Filter by pump type (e.g., 'Centrifugal', 'Rotary')",
                    )
                    .optional(
                        "status",
                        ParameterType::String,
                        "Filter by status (e.g., 'Normal', 'Warning', 'Critical')",
                    ),
            ),
            search_pumps as Executor,
        ),
    ]
}

fn pump_details(store: &DataStore, args: &Arguments) -> AgentResult<Value> {
    let pump_id = str_arg(args, "pump_id")?;
    match pump_id.and_then(|id| store.find_pump(id)) {
        Some(pump) => Ok(json!({ "pump": to_value(pump)?, "found": true })),
        None => Ok(json!({
            "error": format!("Pump with ID {} not found", pump_id.unwrap_or("(none)")),
            "found": false,
        })),
    }
}

fn all_pumps(store: &DataStore, _args: &Arguments) -> AgentResult<Value> {
    let pumps = store.pumps();
    Ok(json!({ "pumps": to_value(pumps)?, "total": pumps.len() }))
}

fn pump_maintenance(store: &DataStore, args: &Arguments) -> AgentResult<Value> {
    let pump_id = str_arg(args, "pump_id")?;
    let logs = pump_id
        .map(|id| store.maintenance_logs(id))
        .unwrap_or_default();
    Ok(json!({
        "pump_id": pump_id,
        "count": logs.len(),
        "maintenance_logs": to_value(logs)?,
    }))
}

fn pump_trends(store: &DataStore, args: &Arguments) -> AgentResult<Value> {
    let pump_id = str_arg(args, "pump_id")?;
    let samples = pump_id.map(|id| store.sensor_trend(id)).unwrap_or_default();
    Ok(json!({
        "pump_id": pump_id,
        "data_points": samples.len(),
        "sensor_data": to_value(samples)?,
    }))
}

fn search_pumps(store: &DataStore, args: &Arguments) -> AgentResult<Value> {
    let filter = PumpFilter {
        location: str_arg(args, "location")?.map(String::from),
        pump_type: str_arg(args, "pump_type")?.map(String::from),
        status: str_arg(args, "status")?.map(String::from),
    };
    let pumps = store.search_pumps(&filter);
    Ok(json!({
        "count": pumps.len(),
        "pumps": to_value(pumps)?,
        "filters": {
            "location": filter.location,
            "pump_type": filter.pump_type,
            "status": filter.status,
        },
    }))
}
