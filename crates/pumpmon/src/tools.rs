//! The catalog of tools advertised to the model and the executors behind them
mod pumps;
mod system;

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::store::DataStore;

pub type Arguments = Map<String, Value>;

/// Runs one tool against the store. Domain misses are `Ok` results with an error shape;
/// `Err` is reserved for malformed arguments and serialization faults.
pub type Executor = fn(&DataStore, &Arguments) -> AgentResult<Value>;

/// Look up an optional string argument. Absent and null are treated the same.
pub(crate) fn str_arg<'a>(args: &'a Arguments, key: &str) -> AgentResult<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(AgentError::InvalidParameters(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

pub(crate) fn to_value<T: serde::Serialize>(value: T) -> AgentResult<Value> {
    serde_json::to_value(value).map_err(|e| AgentError::ExecutionError(e.to_string()))
}

/// Every tool this crate ships, paired with its executor
pub fn builtin() -> Vec<(Tool, Executor)> {
    let mut entries = pumps::entries();
    entries.extend(system::entries());
    entries
}

/// Catalog + dispatch table for the tools the model may call
pub struct ToolRegistry {
    store: Arc<DataStore>,
    tools: Vec<Tool>,
    executors: HashMap<String, Executor>,
}

impl ToolRegistry {
    /// Registry over the built-in tools
    pub fn new(store: Arc<DataStore>) -> AgentResult<Self> {
        let (tools, executors): (Vec<_>, Vec<_>) = builtin()
            .into_iter()
            .map(|(tool, executor)| {
                let name = tool.name.clone();
                (tool, (name, executor))
            })
            .unzip();
        Self::from_parts(store, tools, executors.into_iter().collect())
    }

    /// Build a registry, checking that the advertised catalog and the dispatch table name
    /// exactly the same tools
    pub fn from_parts(
        store: Arc<DataStore>,
        tools: Vec<Tool>,
        executors: HashMap<String, Executor>,
    ) -> AgentResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(AgentError::Internal(format!(
                    "duplicate tool name in catalog: {}",
                    tool.name
                )));
            }
            if !executors.contains_key(&tool.name) {
                return Err(AgentError::Internal(format!(
                    "tool {} is advertised but has no executor",
                    tool.name
                )));
            }
        }
        if let Some(orphan) = executors.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(AgentError::Internal(format!(
                "executor {orphan} has no catalog entry"
            )));
        }

        Ok(Self {
            store,
            tools,
            executors,
        })
    }

    /// The tools to advertise to the model
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Execute a call. Never fails: unknown tools and executor faults come back as
    /// `{"error": ...}` so the model can explain the problem to the user.
    pub fn execute(&self, call: &ToolCall) -> Value {
        info!(tool = %call.name, arguments = ?call.arguments, "executing tool");

        let result = match self.executors.get(&call.name) {
            Some(executor) => executor(&self.store, &call.arguments),
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };

        result.unwrap_or_else(|e| {
            warn!(tool = %call.name, error = %e, "tool returned an error");
            json!({ "error": e.to_string() })
        })
    }
}
