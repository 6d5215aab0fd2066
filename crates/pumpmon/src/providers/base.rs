use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// A fragment of a tool call as it arrives in a stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One streamed delta from the model: visible text, tool call fragments, or neither
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
}

impl StreamChunk {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: Option<&str>, arguments: Option<&str>) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCallDelta {
                index: 0,
                id: None,
                name: name.map(String::from),
                arguments: arguments.map(String::from),
            }],
        }
    }
}

/// Chunks of a single streaming completion. Dropping it abandons the upstream request.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Base trait for chat completion providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streaming completion with the given tools advertised and automatic tool choice
    async fn stream(&self, messages: &[Message], tools: &[Tool]) -> Result<ChunkStream>;

    /// Run a single non-streaming completion constrained to a JSON object response,
    /// returning the raw response text
    async fn complete_json(
        &self,
        messages: &[Message],
        temperature: Option<f32>,
    ) -> Result<(String, Usage)>;
}
