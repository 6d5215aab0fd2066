use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::base::{ChunkStream, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    messages_to_openai_spec, openai_decode_event, openai_response_text, openai_usage,
    tools_to_openai_spec, SseDecoder, StreamEvent,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

const DONE_MARKER: &str = "[DONE]";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base_payload(&self, messages: &[Message]) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });

        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }
        payload
    }

    async fn post(&self, payload: &Value) -> Result<Response> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("Request failed: {}\nResponse: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream(&self, messages: &[Message], tools: &[Tool]) -> Result<ChunkStream> {
        let mut payload = self.base_payload(messages);
        payload["stream"] = json!(true);
        if !tools.is_empty() {
            payload["tools"] = json!(tools_to_openai_spec(tools)?);
            payload["tool_choice"] = json!("auto");
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }

        let response = self.post(&payload).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(async_stream::try_stream! {
            let mut decoder = SseDecoder::default();
            let mut done = false;

            while let Some(bytes) = body.next().await {
                let bytes = bytes?;
                for data in decoder.push(&bytes) {
                    if data == DONE_MARKER {
                        done = true;
                        break;
                    }
                    match openai_decode_event(&data) {
                        Ok(StreamEvent::Chunk(chunk)) => yield chunk,
                        Ok(StreamEvent::Error(error)) => {
                            Err::<(), _>(anyhow!("OpenAI API error: {}", error))?;
                        }
                        Err(e) => debug!(error = %e, "skipping undecodable stream event"),
                    }
                }
                if done {
                    break;
                }
            }

            if !done {
                if let Some(data) = decoder.finish().filter(|data| data != DONE_MARKER) {
                    match openai_decode_event(&data) {
                        Ok(StreamEvent::Chunk(chunk)) => yield chunk,
                        Ok(StreamEvent::Error(error)) => {
                            Err::<(), _>(anyhow!("OpenAI API error: {}", error))?;
                        }
                        Err(e) => debug!(error = %e, "skipping undecodable stream event"),
                    }
                }
            }
        }))
    }

    async fn complete_json(
        &self,
        messages: &[Message],
        temperature: Option<f32>,
    ) -> Result<(String, Usage)> {
        let mut payload = self.base_payload(messages);
        payload["response_format"] = json!({"type": "json_object"});
        if let Some(temp) = temperature.or(self.config.temperature) {
            payload["temperature"] = json!(temp);
        }

        let response: Value = self.post(&payload).await?.json().await?;
        if let Some(error) = response.get("error") {
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        Ok((openai_response_text(&response)?, openai_usage(&response)))
    }
}
