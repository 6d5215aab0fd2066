use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::base::{StreamChunk, ToolCallDelta, Usage};
use crate::models::message::{Message, Role};
use crate::models::tool::Tool;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            // legacy function results carry a name but no call id to answer
            let role = match (message.role, &message.tool_call_id) {
                (Role::Tool, None) => json!("function"),
                (role, _) => json!(role),
            };

            let content = match &message.content {
                Some(text) => json!(text),
                None if !message.tool_calls.is_empty() => Value::Null,
                None => json!(""),
            };

            let mut converted = json!({
                "role": role,
                "content": content,
            });

            if let Some(name) = message.name.as_deref().filter(|name| !name.is_empty()) {
                converted["name"] = json!(name);
            }
            if !message.tool_calls.is_empty() {
                converted["tool_calls"] = message
                    .tool_calls
                    .iter()
                    .map(|request| {
                        json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": request.name,
                                "arguments": request.arguments,
                            }
                        })
                    })
                    .collect();
            }
            if let Some(id) = &message.tool_call_id {
                converted["tool_call_id"] = json!(id);
            }

            converted
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters.to_json_schema(),
            }
        }));
    }

    Ok(result)
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamEvent {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    #[serde(default)]
    function: OpenAiFunctionDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// One decoded `data:` event of a streamed completion
#[derive(Debug, PartialEq)]
pub enum StreamEvent {
    Chunk(StreamChunk),
    /// The upstream reported a failure in the middle of the stream
    Error(Value),
}

/// Decode the JSON payload of one streamed `data:` event. Only the first choice is read.
pub fn openai_decode_event(data: &str) -> Result<StreamEvent> {
    let event: OpenAiStreamEvent = serde_json::from_str(data)?;
    if let Some(error) = event.error.filter(|error| !error.is_null()) {
        return Ok(StreamEvent::Error(error));
    }
    let Some(choice) = event.choices.into_iter().next() else {
        return Ok(StreamEvent::Chunk(StreamChunk::default()));
    };

    let tool_calls = choice
        .delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallDelta {
            index: call.index,
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(StreamEvent::Chunk(StreamChunk {
        content: choice.delta.content,
        tool_calls,
    }))
}

/// Extract the assistant text of a non-streaming completion
pub fn openai_response_text(response: &Value) -> Result<String> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No choices in response"))?;

    Ok(message
        .get("content")
        .and_then(|content| content.as_str())
        .unwrap_or_default()
        .to_string())
}

pub fn openai_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usage") else {
        return Usage::default();
    };
    let read = |key: &str| usage.get(key).and_then(|v| v.as_i64()).map(|v| v as i32);

    let input_tokens = read("prompt_tokens");
    let output_tokens = read("completion_tokens");
    let total_tokens = read("total_tokens").or_else(|| match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => Some(input + output),
        _ => None,
    });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Splits a server-sent event byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available so multi-byte characters split across
/// network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(data) = Self::data_field(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(self) -> Option<String> {
        Self::data_field(&self.buffer)
    }

    fn data_field(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\n', '\r']);
        line.strip_prefix("data:")
            .map(|data| data.strip_prefix(' ').unwrap_or(data).to_string())
    }
}
