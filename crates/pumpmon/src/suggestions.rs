use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::message::Message;
use crate::prompt_template::{load_prompt, SUGGESTIONS_PROMPT};
use crate::providers::base::Provider;
use crate::store::DataStore;

pub const SUGGESTIONS_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant that only responds with valid JSON.";
pub const SUGGESTIONS_TEMPERATURE: f32 = 0.7;
pub const MAX_SUGGESTIONS: usize = 5;

/// Follow-up questions offered to the user after a turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl SuggestionSet {
    /// Read the model's JSON reply. Anything unusable yields an empty set.
    pub fn from_model_reply(text: &str) -> Self {
        match serde_json::from_str::<SuggestionSet>(text) {
            Ok(set) => Self {
                suggestions: set
                    .suggestions
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .take(MAX_SUGGESTIONS)
                    .collect(),
            },
            Err(e) => {
                warn!(error = %e, "model returned unusable suggestions");
                Self::default()
            }
        }
    }
}

#[derive(Serialize)]
struct SuggestionContext<'a> {
    user_message: &'a str,
    total_pumps: usize,
    critical_alerts: usize,
    system_health: f64,
}

/// One-shot JSON completion that proposes follow-up questions. Has no tool access.
pub struct SuggestionGenerator {
    provider: Arc<dyn Provider>,
    store: Arc<DataStore>,
}

impl SuggestionGenerator {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<DataStore>) -> Self {
        Self { provider, store }
    }

    /// Transport failures are returned; malformed replies are not.
    pub async fn suggest(&self, user_message: &str, history: &[Message]) -> Result<SuggestionSet> {
        let stats = self.store.dashboard_stats();
        let prompt = load_prompt(
            SUGGESTIONS_PROMPT,
            &SuggestionContext {
                user_message,
                total_pumps: stats.total_pumps,
                critical_alerts: stats.critical_alerts,
                system_health: stats.system_health,
            },
        )?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system().with_text(SUGGESTIONS_SYSTEM_MESSAGE));
        messages.extend(history.iter().map(|message| Message {
            role: message.role,
            content: message.content.clone(),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }));
        messages.push(Message::user().with_text(prompt));

        let (reply, usage) = self
            .provider
            .complete_json(&messages, Some(SUGGESTIONS_TEMPERATURE))
            .await?;
        debug!(total_tokens = ?usage.total_tokens, "suggestion completion finished");

        Ok(SuggestionSet::from_model_reply(&reply))
    }
}
