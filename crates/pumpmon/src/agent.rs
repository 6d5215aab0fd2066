use anyhow::{anyhow, Result};
use chrono::Local;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolInvocation};
use crate::prompt_template::{load_prompt, load_prompt_file, SYSTEM_PROMPT};
use crate::providers::base::{ChunkStream, Provider, StreamChunk};
use crate::tools::ToolRegistry;

/// How prior conversation entries are ordered in the outbound request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    /// Named entries first, then unnamed ones, each group in the order received
    #[default]
    NamedFirst,
    /// History exactly as the caller sent it
    Chronological,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on one streaming completion, from request to last chunk
    pub stream_timeout: Duration,
    /// Upper bound on a single tool execution
    pub tool_timeout: Duration,
    pub history_order: HistoryOrder,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            stream_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(10),
            history_order: HistoryOrder::default(),
        }
    }
}

#[derive(Serialize)]
struct ToolInfo<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct SystemPromptContext<'a> {
    current_date: String,
    tools: Vec<ToolInfo<'a>>,
}

/// Render the assistant's system prompt, from `override_path` if given or the bundled template
pub fn render_system_prompt(tools: &[Tool], override_path: Option<&Path>) -> AgentResult<String> {
    let context = SystemPromptContext {
        current_date: Local::now().format("%d %b %Y").to_string(),
        tools: tools
            .iter()
            .map(|tool| ToolInfo {
                name: &tool.name,
                description: &tool.description,
            })
            .collect(),
    };

    let rendered = match override_path {
        Some(path) => load_prompt_file(path, &context),
        None => load_prompt(SYSTEM_PROMPT, &context),
    };
    rendered.map_err(|e| AgentError::Internal(format!("failed to render system prompt: {e}")))
}

/// Agent drives one chat turn at a time against the provider, with a single tool detour
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        system_prompt: String,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt,
            config,
        }
    }

    pub fn tools(&self) -> &[Tool] {
        self.tools.tools()
    }

    /// The outbound conversation: system prompt, history, then the new user message
    pub fn build_messages(&self, user_message: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system().with_text(&self.system_prompt));

        match self.config.history_order {
            HistoryOrder::NamedFirst => {
                let (named, unnamed): (Vec<&Message>, Vec<&Message>) =
                    history.iter().partition(|message| message.is_named());
                messages.extend(named.into_iter().cloned());
                messages.extend(unnamed.into_iter().cloned());
            }
            HistoryOrder::Chronological => messages.extend(history.iter().cloned()),
        }

        messages.push(Message::user().with_text(user_message));
        messages
    }

    /// Stream the assistant's visible answer to `user_message`.
    ///
    /// The stream is finite and ends after the first error. Dropping it early releases the
    /// upstream connection.
    pub fn stream_turn(
        &self,
        user_message: &str,
        history: &[Message],
    ) -> BoxStream<'static, Result<String>> {
        info!(history = history.len(), "starting chat turn");
        let turn = Turn {
            agent: self.clone(),
            messages: self.build_messages(user_message, history),
        };

        Box::pin(stream::unfold(
            (turn, TurnState::Start),
            |(mut turn, state)| async move {
                let (item, next) = turn.advance(state).await?;
                Some((item, (turn, next)))
            },
        ))
    }

    async fn open_stream(&self, messages: &[Message]) -> Result<(ChunkStream, Instant)> {
        let deadline = Instant::now() + self.config.stream_timeout;
        let upstream = timeout_at(deadline, self.provider.stream(messages, self.tools.tools()))
            .await
            .map_err(|_| self.stream_timed_out())??;
        Ok((upstream, deadline))
    }

    async fn next_chunk(
        &self,
        upstream: &mut ChunkStream,
        deadline: Instant,
    ) -> Result<Option<StreamChunk>> {
        match timeout_at(deadline, upstream.next()).await {
            Ok(Some(chunk)) => chunk.map(Some),
            Ok(None) => Ok(None),
            Err(_) => Err(self.stream_timed_out()),
        }
    }

    fn stream_timed_out(&self) -> anyhow::Error {
        anyhow!(
            "upstream stream timed out after {}s",
            self.config.stream_timeout.as_secs()
        )
    }

    /// Run the tool on the blocking pool. Timeouts and panics become `{"error": ...}` results.
    async fn execute_tool(&self, invocation: ToolInvocation) -> Value {
        let name = invocation.name.clone();
        info!(tool = %name, arguments = %invocation.raw_arguments, "executing tool call");

        let registry = Arc::clone(&self.tools);
        let task = tokio::task::spawn_blocking(move || registry.execute(&invocation.into_call()));

        match timeout(self.config.tool_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!(tool = %name, error = %e, "tool execution aborted");
                json!({ "error": format!("{name} failed to run") })
            }
            Err(_) => {
                warn!(tool = %name, "tool execution timed out");
                json!({
                    "error": format!(
                        "{name} timed out after {}s",
                        self.config.tool_timeout.as_secs()
                    )
                })
            }
        }
    }
}

/// Tool call fragments seen so far in the first phase
#[derive(Debug, Default)]
struct ToolCapture {
    name: Option<String>,
    arguments: String,
}

impl ToolCapture {
    fn absorb(&mut self, chunk: &StreamChunk) {
        for delta in &chunk.tool_calls {
            if let Some(name) = delta.name.as_deref().filter(|name| !name.is_empty()) {
                if self.name.as_deref() != Some(name) {
                    debug!(tool = %name, "model requested a tool call");
                }
                self.name = Some(name.to_string());
            }
            if let Some(arguments) = &delta.arguments {
                self.arguments.push_str(arguments);
            }
        }
    }

    fn into_invocation(self) -> Option<ToolInvocation> {
        let name = self.name?;
        Some(ToolInvocation {
            name,
            raw_arguments: self.arguments,
        })
    }
}

enum TurnState {
    Start,
    /// First completion; `capture` is set once any tool call fragment arrives
    Streaming {
        upstream: ChunkStream,
        deadline: Instant,
        capture: Option<ToolCapture>,
    },
    ExecutingTool(ToolInvocation),
    /// Second completion after the tool result; tool call fragments are ignored
    FollowUp {
        upstream: ChunkStream,
        deadline: Instant,
    },
    Done,
}

/// Turn-local state shared by every step of one `stream_turn`
struct Turn {
    agent: Agent,
    messages: Vec<Message>,
}

impl Turn {
    /// Drive the state machine until it has a token or an error to hand out, or is finished
    async fn advance(&mut self, mut state: TurnState) -> Option<(Result<String>, TurnState)> {
        loop {
            state = match state {
                TurnState::Start => match self.agent.open_stream(&self.messages).await {
                    Ok((upstream, deadline)) => TurnState::Streaming {
                        upstream,
                        deadline,
                        capture: None,
                    },
                    Err(e) => return Some(self.fail(e)),
                },

                TurnState::Streaming {
                    mut upstream,
                    deadline,
                    mut capture,
                } => match self.agent.next_chunk(&mut upstream, deadline).await {
                    Ok(Some(chunk)) => {
                        if !chunk.tool_calls.is_empty() {
                            capture.get_or_insert_with(ToolCapture::default).absorb(&chunk);
                        }
                        let visible = match (&capture, chunk.content) {
                            (None, Some(text)) if !text.is_empty() => Some(text),
                            _ => None,
                        };
                        let next = TurnState::Streaming {
                            upstream,
                            deadline,
                            capture,
                        };
                        match visible {
                            Some(text) => return Some((Ok(text), next)),
                            None => next,
                        }
                    }
                    Ok(None) => match capture.and_then(ToolCapture::into_invocation) {
                        Some(invocation) => TurnState::ExecutingTool(invocation),
                        None => TurnState::Done,
                    },
                    Err(e) => return Some(self.fail(e)),
                },

                TurnState::ExecutingTool(invocation) => {
                    let call_id = format!("call_{}", Uuid::new_v4().simple());
                    let name = invocation.name.clone();
                    let raw_arguments = invocation.raw_arguments.trim().to_string();

                    let result = self.agent.execute_tool(invocation).await;

                    self.messages.push(Message::assistant().with_tool_request(
                        &call_id,
                        &name,
                        raw_arguments,
                    ));
                    self.messages
                        .push(Message::tool(&call_id).with_text(result.to_string()));

                    info!(tool = %name, "requesting follow-up completion with tool result");
                    match self.agent.open_stream(&self.messages).await {
                        Ok((upstream, deadline)) => TurnState::FollowUp { upstream, deadline },
                        Err(e) => return Some(self.fail(e)),
                    }
                }

                TurnState::FollowUp {
                    mut upstream,
                    deadline,
                } => match self.agent.next_chunk(&mut upstream, deadline).await {
                    Ok(Some(chunk)) => {
                        let next = TurnState::FollowUp { upstream, deadline };
                        match chunk.content.filter(|text| !text.is_empty()) {
                            Some(text) => return Some((Ok(text), next)),
                            None => next,
                        }
                    }
                    Ok(None) => TurnState::Done,
                    Err(e) => return Some(self.fail(e)),
                },

                TurnState::Done => {
                    debug!("chat turn complete");
                    return None;
                }
            };
        }
    }

    fn fail(&self, e: anyhow::Error) -> (Result<String>, TurnState) {
        error!(error = %e, "chat turn failed");
        (Err(e), TurnState::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Role;
    use crate::models::tool::ParameterSchema;
    use crate::providers::mock::{MockProvider, MockStream};
    use crate::store::DataStore;
    use crate::tools::{Arguments, Executor};
    use futures::TryStreamExt;
    use std::collections::HashMap;

    fn agent_with(provider: MockProvider, config: AgentConfig) -> Agent {
        let registry = ToolRegistry::new(Arc::new(DataStore::sample())).unwrap();
        Agent::new(
            Arc::new(provider),
            Arc::new(registry),
            "You are a pump assistant.".to_string(),
            config,
        )
    }

    fn agent(provider: MockProvider) -> Agent {
        agent_with(provider, AgentConfig::default())
    }

    fn slow_tool(_: &DataStore, _: &Arguments) -> AgentResult<Value> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(json!({"done": true}))
    }

    fn broken_tool(_: &DataStore, _: &Arguments) -> AgentResult<Value> {
        panic!("sensor bus unavailable");
    }

    /// Agent whose registry holds a single custom tool, with a short tool timeout
    fn agent_with_tool(provider: MockProvider, name: &str, executor: Executor) -> Agent {
        let mut executors: HashMap<String, Executor> = HashMap::new();
        executors.insert(name.to_string(), executor);
        let registry = ToolRegistry::from_parts(
            Arc::new(DataStore::sample()),
            vec![Tool::new(name, "Test tool", ParameterSchema::empty())],
            executors,
        )
        .unwrap();
        Agent::new(
            Arc::new(provider),
            Arc::new(registry),
            "You are a pump assistant.".to_string(),
            AgentConfig {
                tool_timeout: Duration::from_millis(20),
                ..AgentConfig::default()
            },
        )
    }

    fn text_stream(parts: &[&str]) -> MockStream {
        MockStream::Chunks(parts.iter().map(|part| StreamChunk::text(*part)).collect())
    }

    async fn collect(agent: &Agent, message: &str, history: &[Message]) -> Result<Vec<String>> {
        agent.stream_turn(message, history).try_collect().await
    }

    fn tool_messages(request: &[Message]) -> Vec<&Message> {
        request
            .iter()
            .filter(|message| message.role == Role::Tool)
            .collect()
    }

    fn tool_result(request: &[Message]) -> Value {
        let content = tool_messages(request)[0].content.as_deref().unwrap();
        serde_json::from_str(content).unwrap()
    }

    #[tokio::test]
    async fn test_plain_answer() -> Result<()> {
        let provider = MockProvider::new(vec![text_stream(&["Hello", " ", "", "world"])]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "Hi", &[]).await?;
        assert_eq!(tokens, vec!["Hello", " ", "world"]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0].role, Role::System);
        assert_eq!(requests[0][1].content.as_deref(), Some("Hi"));
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::tool_call(Some("get_pump_details"), Some("")),
                StreamChunk::tool_call(None, Some("{\"pump_")),
                StreamChunk::tool_call(None, Some("id\": \"P003\"}")),
            ]),
            text_stream(&["P003 is ", "overheating."]),
        ]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "How is P003?", &[]).await?;
        assert_eq!(tokens.concat(), "P003 is overheating.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.len(), requests[0].len() + 2);

        let request = &second[second.len() - 2];
        assert_eq!(request.role, Role::Assistant);
        assert_eq!(request.content, None);
        assert_eq!(request.tool_calls.len(), 1);
        assert_eq!(request.tool_calls[0].name, "get_pump_details");
        assert_eq!(request.tool_calls[0].arguments, "{\"pump_id\": \"P003\"}");

        let tools = tool_messages(second);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].tool_call_id.as_deref(), Some(request.tool_calls[0].id.as_str()));
        let result = tool_result(second);
        assert_eq!(result["found"], json!(true));
        assert_eq!(result["pump"]["status"], json!("Critical"));
        Ok(())
    }

    #[tokio::test]
    async fn test_both_requests_advertise_full_catalog() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("get_all_pumps"), None)]),
            text_stream(&["Nine pumps."]),
        ]);
        let agent = agent(provider.clone());

        collect(&agent, "List pumps", &[]).await?;
        assert_eq!(provider.advertised_tool_counts(), vec![7, 7]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool_still_completes() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("reboot_plant"), Some("{}"))]),
            text_stream(&["I can't do that."]),
        ]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "Reboot", &[]).await?;
        assert_eq!(tokens.concat(), "I can't do that.");
        assert_eq!(
            tool_result(&provider.requests()[1]),
            json!({"error": "reboot_plant is not implemented"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_arguments_run_with_empty_mapping() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(
                Some("get_pump_details"),
                Some("{\"pump_id\": \"P0"),
            )]),
            text_stream(&["Which pump?"]),
        ]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "Details", &[]).await?;
        assert_eq!(tokens.concat(), "Which pump?");

        let result = tool_result(&provider.requests()[1]);
        assert_eq!(result["found"], json!(false));
        assert_eq!(result["error"], json!("Pump with ID (none) not found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_whitespace_arguments_mean_no_arguments() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("get_dashboard_stats"), Some("  \n"))]),
            text_stream(&["All good."]),
        ]);
        let agent = agent(provider.clone());

        collect(&agent, "Stats?", &[]).await?;
        let second = &provider.requests()[1];
        assert_eq!(tool_result(second)["total_pumps"], json!(9));
        assert_eq!(second[second.len() - 2].tool_calls[0].arguments, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_content_during_tool_phase_is_suppressed() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::text("Let me check. "),
                StreamChunk::tool_call(Some("get_all_pumps"), None),
                StreamChunk::text("leaked"),
            ]),
            text_stream(&["Here they are."]),
        ]);
        let agent = agent(provider);

        let tokens = collect(&agent, "Pumps?", &[]).await?;
        assert_eq!(tokens, vec!["Let me check. ", "Here they are."]);
        Ok(())
    }

    #[tokio::test]
    async fn test_last_tool_name_wins() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::tool_call(Some("get_all_pumps"), Some("")),
                StreamChunk::tool_call(Some("get_system_alerts"), Some("{}")),
            ]),
            text_stream(&["Alerts listed."]),
        ]);
        let agent = agent(provider.clone());

        collect(&agent, "What's wrong?", &[]).await?;
        let second = &provider.requests()[1];
        assert_eq!(tool_messages(second).len(), 1);
        assert_eq!(second[second.len() - 2].tool_calls[0].name, "get_system_alerts");
        assert_eq!(tool_result(second)["count"], json!(6));
        Ok(())
    }

    #[tokio::test]
    async fn test_argument_fragments_without_name_do_not_execute() -> Result<()> {
        let provider = MockProvider::new(vec![MockStream::Chunks(vec![
            StreamChunk::text("Partial "),
            StreamChunk::tool_call(None, Some("{}")),
            StreamChunk::text("hidden"),
        ])]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "Hi", &[]).await?;
        assert_eq!(tokens, vec!["Partial "]);
        assert_eq!(provider.requests().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_level_tool_call_is_ignored() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("get_all_pumps"), None)]),
            MockStream::Chunks(vec![
                StreamChunk::text("Nine pumps"),
                StreamChunk::tool_call(Some("get_dashboard_stats"), Some("{}")),
                StreamChunk::text(" in total."),
            ]),
        ]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "Pumps?", &[]).await?;
        assert_eq!(tokens.concat(), "Nine pumps in total.");
        assert_eq!(provider.requests().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_after_partial_output() {
        let provider = MockProvider::new(vec![MockStream::FailAfter(
            vec![StreamChunk::text("Pump P003 ")],
            "connection reset".to_string(),
        )]);
        let agent = agent(provider);

        let items: Vec<Result<String>> = agent.stream_turn("P003?", &[]).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Pump P003 ");
        assert!(items[1].as_ref().unwrap_err().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_refused_stream_fails_turn() {
        let provider = MockProvider::new(vec![MockStream::Refuse("Server error: 503".to_string())]);
        let agent = agent(provider);

        let items: Vec<Result<String>> = agent.stream_turn("Hi", &[]).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn test_refused_follow_up_fails_turn() {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("get_all_pumps"), None)]),
            MockStream::Refuse("Server error: 429".to_string()),
        ]);
        let agent = agent(provider.clone());

        let items: Vec<Result<String>> = agent.stream_turn("Pumps?", &[]).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().to_string().contains("429"));
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_named_history_first() -> Result<()> {
        let provider = MockProvider::new(vec![text_stream(&["ok"])]);
        let agent = agent(provider.clone());
        let history = vec![
            Message::user().with_text("b"),
            Message::user().with_text("a").with_name("n"),
            Message::assistant().with_text("c"),
        ];

        collect(&agent, "next", &history).await?;
        let requests = provider.requests();
        let contents: Vec<Option<&str>> = requests[0]
            .iter()
            .skip(1)
            .map(|message| message.content.as_deref())
            .collect();
        assert_eq!(contents, vec![Some("a"), Some("b"), Some("c"), Some("next")]);
        Ok(())
    }

    #[test]
    fn test_chronological_history() {
        let agent = agent_with(
            MockProvider::default(),
            AgentConfig {
                history_order: HistoryOrder::Chronological,
                ..AgentConfig::default()
            },
        );
        let history = vec![
            Message::user().with_text("b"),
            Message::user().with_text("a").with_name("n"),
        ];

        let messages = agent.build_messages("next", &history);
        let contents: Vec<Option<&str>> =
            messages.iter().map(|message| message.content.as_deref()).collect();
        assert_eq!(
            contents,
            vec![Some("You are a pump assistant."), Some("b"), Some("a"), Some("next")]
        );
    }

    #[test]
    fn test_empty_name_is_not_named() {
        let agent = agent(MockProvider::default());
        let history = vec![
            Message::user().with_text("first").with_name(""),
            Message::user().with_text("second").with_name("n"),
        ];

        let messages = agent.build_messages("next", &history);
        assert_eq!(messages[1].content.as_deref(), Some("second"));
        assert_eq!(messages[2].content.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_early_drop_stops_requests() {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::text("one"),
                StreamChunk::tool_call(Some("get_all_pumps"), None),
            ]),
            text_stream(&["unused"]),
        ]);
        let agent = agent(provider.clone());

        let mut stream = agent.stream_turn("Hi", &[]);
        assert_eq!(stream.next().await.unwrap().unwrap(), "one");
        drop(stream);
        assert_eq!(provider.requests().len(), 1);

        // Read to the end, the same script does issue the follow-up request
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::text("one"),
                StreamChunk::tool_call(Some("get_all_pumps"), None),
            ]),
            text_stream(&["two"]),
        ]);
        let agent = agent_with(provider.clone(), AgentConfig::default());
        let tokens: Vec<String> = agent.stream_turn("Hi", &[]).try_collect().await.unwrap();
        assert_eq!(tokens, vec!["one", "two"]);
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_timeout_becomes_error_result() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("slow_tool"), Some("{}"))]),
            text_stream(&["The lookup took too long."]),
        ]);
        let agent = agent_with_tool(provider.clone(), "slow_tool", slow_tool);

        let tokens = collect(&agent, "Check it", &[]).await?;
        assert_eq!(tokens.concat(), "The lookup took too long.");

        let result = tool_result(&provider.requests()[1]);
        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("slow_tool timed out after"));
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_panic_becomes_error_result() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![StreamChunk::tool_call(Some("broken_tool"), None)]),
            text_stream(&["That tool failed."]),
        ]);
        let agent = agent_with_tool(provider.clone(), "broken_tool", broken_tool);

        let tokens = collect(&agent, "Check it", &[]).await?;
        assert_eq!(tokens.concat(), "That tool failed.");
        assert_eq!(
            tool_result(&provider.requests()[1]),
            json!({"error": "broken_tool failed to run"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_chunk_with_content_and_tool_fragment() -> Result<()> {
        let provider = MockProvider::new(vec![
            MockStream::Chunks(vec![
                StreamChunk::text("Checking "),
                StreamChunk {
                    content: Some("hidden".to_string()),
                    ..StreamChunk::tool_call(
                        Some("get_pump_details"),
                        Some("{\"pump_id\": \"P008\"}"),
                    )
                },
                StreamChunk::text("also hidden"),
            ]),
            text_stream(&["P008 is vibrating."]),
        ]);
        let agent = agent(provider.clone());

        let tokens = collect(&agent, "P008?", &[]).await?;
        assert_eq!(tokens, vec!["Checking ", "P008 is vibrating."]);
        assert_eq!(tool_result(&provider.requests()[1])["pump"]["id"], json!("P008"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_times_out() {
        let provider = MockProvider::new(vec![MockStream::Stall(vec![StreamChunk::text("slow ")])]);
        let agent = agent_with(
            provider,
            AgentConfig {
                stream_timeout: Duration::from_secs(5),
                ..AgentConfig::default()
            },
        );

        let items: Vec<Result<String>> = agent.stream_turn("Hi", &[]).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "slow ");
        assert!(items[1].as_ref().unwrap_err().to_string().contains("timed out"));
    }

    #[test]
    fn test_render_system_prompt_lists_tools() {
        let registry = ToolRegistry::new(Arc::new(DataStore::sample())).unwrap();
        let prompt = render_system_prompt(registry.tools(), None).unwrap();
        assert!(prompt.contains("pump monitoring"));
        for tool in registry.tools() {
            assert!(prompt.contains(&format!("- {}:", tool.name)));
        }
    }

    #[test]
    fn test_render_system_prompt_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "{{ tools | length }} tools").unwrap();

        let registry = ToolRegistry::new(Arc::new(DataStore::sample())).unwrap();
        let prompt = render_system_prompt(registry.tools(), Some(&path)).unwrap();
        assert_eq!(prompt, "7 tools");

        let missing = render_system_prompt(registry.tools(), Some(&dir.path().join("nope.md")));
        assert!(matches!(missing, Err(AgentError::Internal(_))));
    }
}
