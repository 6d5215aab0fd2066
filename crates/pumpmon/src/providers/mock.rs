use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{ChunkStream, Provider, StreamChunk, Usage};

/// What the mock answers to one streaming request
pub enum MockStream {
    /// Stream these chunks and end normally
    Chunks(Vec<StreamChunk>),
    /// Stream these chunks, then fail mid-stream
    FailAfter(Vec<StreamChunk>, String),
    /// Stream these chunks, then never produce another one
    Stall(Vec<StreamChunk>),
    /// Refuse to open the stream at all
    Refuse(String),
}

/// A mock provider that returns pre-configured responses and records every request
#[derive(Clone, Default)]
pub struct MockProvider {
    streams: Arc<Mutex<Vec<MockStream>>>,
    json_replies: Arc<Mutex<Vec<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    advertised: Arc<Mutex<Vec<usize>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of streaming responses
    pub fn new(streams: Vec<MockStream>) -> Self {
        Self {
            streams: Arc::new(Mutex::new(streams)),
            ..Default::default()
        }
    }

    /// Queue replies for `complete_json`; `Err` simulates a transport failure
    pub fn with_json_replies(self, replies: Vec<Result<String, String>>) -> Self {
        *self.json_replies.lock().unwrap() = replies;
        self
    }

    /// The message lists sent with each request, in order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// How many tools were advertised with each streaming request
    pub fn advertised_tool_counts(&self) -> Vec<usize> {
        self.advertised.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(&self, messages: &[Message], tools: &[Tool]) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.advertised.lock().unwrap().push(tools.len());

        let next = {
            let mut streams = self.streams.lock().unwrap();
            if streams.is_empty() {
                MockStream::Chunks(Vec::new())
            } else {
                streams.remove(0)
            }
        };

        match next {
            MockStream::Chunks(chunks) => Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok)))),
            MockStream::FailAfter(chunks, error) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(anyhow!(error))));
                Ok(Box::pin(stream::iter(items)))
            }
            MockStream::Stall(chunks) => Ok(Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::pending()),
            )),
            MockStream::Refuse(error) => Err(anyhow!(error)),
        }
    }

    async fn complete_json(
        &self,
        messages: &[Message],
        _temperature: Option<f32>,
    ) -> Result<(String, Usage)> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let mut replies = self.json_replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(("{}".to_string(), Usage::default()));
        }
        match replies.remove(0) {
            Ok(text) => Ok((text, Usage::default())),
            Err(error) => Err(anyhow!(error)),
        }
    }
}
