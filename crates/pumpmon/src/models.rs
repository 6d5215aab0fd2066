//! These models represent the objects passed between the caller, the agent and the LLM
//!
//! There are a few related formats we need to interact with:
//! - chat history sent by the frontend alongside each new message
//! - openai chat-completion messages and tool specs, sent from the agent to the LLM
//! - streamed deltas coming back from the LLM
//!
//! The caller's history entries deserialize straight into [`message::Message`]; conversion to
//! the provider wire format happens in `providers::utils`.
pub mod message;
pub mod tool;
