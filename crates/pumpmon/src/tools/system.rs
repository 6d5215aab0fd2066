use serde_json::{json, Value};

use super::{str_arg, to_value, Arguments, Executor};
use crate::errors::AgentResult;
use crate::models::tool::{ParameterSchema, ParameterType, Tool};
use crate::store::{AlertFilter, DataStore};

pub(super) fn entries() -> Vec<(Tool, Executor)> {
    vec![
        (
            Tool::new(
                "get_system_alerts",
                "Get current system alerts and anomalies",
                ParameterSchema::empty()
                    .optional(
                        "status",
                        ParameterType::String,
                        "Optional filter by status: 'Active', 'Acknowledged', 'Resolved'",
                    )
                    .optional(
                        "priority",
                        ParameterType::String,
                        "Optional filter by priority: 'Critical', 'High', 'Medium', 'Low'",
                    ),
            ),
            system_alerts as Executor,
        ),
        (
            Tool::new(
                "get_dashboard_stats",
                "Get overall system statistics and health metrics",
                ParameterSchema::empty(),
            ),
            dashboard_stats as Executor,
        ),
    ]
}

fn system_alerts(store: &DataStore, args: &Arguments) -> AgentResult<Value> {
    let filter = AlertFilter {
        status: str_arg(args, "status")?.map(String::from),
        priority: str_arg(args, "priority")?.map(String::from),
        pump_id: None,
    };
    let alerts = store.list_alerts(&filter);
    Ok(json!({
        "count": alerts.len(),
        "alerts": to_value(alerts)?,
        "filters": { "status": filter.status, "priority": filter.priority },
    }))
}

fn dashboard_stats(store: &DataStore, _args: &Arguments) -> AgentResult<Value> {
    to_value(store.dashboard_stats())
}
