use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Debug;

/// JSON types a tool parameter can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
}

/// A single named parameter accepted by a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: String,
}

/// The parameters a tool accepts and which of them are required
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub properties: Vec<ToolParameter>,
    pub required: Vec<String>,
}

impl ParameterSchema {
    /// A schema with no parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an optional parameter
    pub fn optional<N, D>(mut self, name: N, kind: ParameterType, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.properties.push(ToolParameter {
            name: name.into(),
            kind,
            description: description.into(),
        });
        self
    }

    /// Add a parameter and mark it as required
    pub fn required<N, D>(self, name: N, kind: ParameterType, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        let name = name.into();
        let mut schema = self.optional(name.clone(), kind, description);
        schema.required.push(name);
        schema
    }

    /// Render as a JSON schema object
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|param| {
                (
                    param.name.clone(),
                    json!({
                        "type": param.kind,
                        "description": param.description,
                    }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// Parameters that the tool accepts
    pub parameters: ParameterSchema,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: ParameterSchema) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call request that the registry can execute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The parameters for the execution
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A tool call being assembled from streamed fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub raw_arguments: String,
}

impl ToolInvocation {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            raw_arguments: String::new(),
        }
    }

    /// Parse the accumulated argument text into a call.
    ///
    /// Blank text means no arguments. Text that is not a JSON object is logged and replaced
    /// with an empty mapping so the tool still runs.
    pub fn into_call(self) -> ToolCall {
        let raw = self.raw_arguments.trim();
        let arguments = if raw.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    tracing::error!(tool = %self.name, arguments = %other, "tool arguments are not an object");
                    Map::new()
                }
                Err(e) => {
                    tracing::error!(tool = %self.name, error = %e, "failed to parse tool call arguments");
                    Map::new()
                }
            }
        };
        ToolCall::new(self.name, arguments)
    }
}
