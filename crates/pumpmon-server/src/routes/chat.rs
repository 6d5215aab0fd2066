use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use pumpmon::models::message::Message;
use pumpmon::suggestions::SuggestionSet;
use serde::Deserialize;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    chat_history: Option<Vec<Message>>,
}

/// Raw token text, flushed to the client as each token arrives. An `Err` aborts the body.
pub struct SseResponse {
    rx: ReceiverStream<io::Result<String>>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<io::Result<String>>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|item| item.map(Bytes::from)))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = axum::body::Body::from_stream(self);

        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

fn preview(message: &str) -> String {
    message.chars().take(50).collect()
}

async fn stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, ApiError> {
    tracing::info!(message = %preview(&request.message), "received chat request");

    let history = request.chat_history.unwrap_or_default();
    let mut stream = state.agent.stream_turn(&request.message, &history);

    // A failure before the first token still gets an error status
    let first = match stream.next().await {
        Some(Err(e)) => {
            tracing::error!("Error streaming chat response: {}", e);
            return Err(ApiError::Upstream("Error generating chat response".to_string()));
        }
        other => other,
    };

    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        let mut item = first;

        loop {
            match item {
                Some(Ok(token)) => {
                    if let Err(e) = tx.send(Ok(token)).await {
                        tracing::error!("Error sending token through channel: {}", e);
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::error!("Error streaming chat response: {}", e);
                    let aborted = io::Error::new(io::ErrorKind::Other, e.to_string());
                    let _ = tx.send(Err(aborted)).await;
                    break;
                }
                None => break,
            }

            item = tokio::select! {
                // Dropping the turn stream releases the upstream request
                _ = tx.closed() => {
                    tracing::info!("client disconnected, abandoning chat turn");
                    break;
                }
                next = stream.next() => next,
            };
        }
    });

    Ok(SseResponse::new(ReceiverStream::new(rx)))
}

async fn suggestions_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<SuggestionSet>, ApiError> {
    tracing::info!(message = %preview(&request.message), "generating suggestions");

    let history = request.chat_history.unwrap_or_default();
    state
        .suggestions
        .suggest(&request.message, &history)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error generating chat suggestions: {}", e);
            ApiError::Upstream(format!("Error generating suggestions: {e}"))
        })
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat/stream", post(stream_handler))
        .route("/chat/suggestions", post(suggestions_handler))
        .with_state(state)
}
