//! Agent State Machine
//!
//! Drives one turn through `AwaitingModel → AwaitingToolResult →
//! AwaitingModel → … → Finalizing → Done`:
//!
//! ```text
//!                 ┌──────────── continue ────────────┐
//!                 ▼                                  │
//!   ┌───────────────────┐  continue  ┌────────────────────┐
//!   │   AwaitingModel   │───────────▶│ AwaitingToolResult │
//!   └───────────────────┘            └────────────────────┘
//!        │ finalize   │ end
//!        ▼            ▼
//!   ┌────────────┐  ┌──────┐
//!   │ Finalizing │─▶│ Done │
//!   └────────────┘  └──────┘
//! ```
//!
//! Each transition awaits the gateway or the tool registry before the next
//! one starts; there is no parallelism within a turn.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::locale::Locale;
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::routing::{Route, RoutingPolicy};
use crate::tool::{ToolRegistry, ToolSchema};
use crate::turn::{ConversationTurn, FinalizeSource, ModelUtterance, Step, Termination, TurnState};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instruction sent first on every model call
    pub system_prompt: String,

    /// Maximum model calls per turn
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// How replies without tool calls are recognized as final
    pub routing: RoutingPolicy,

    /// Upper bound on a single gateway call
    pub gateway_timeout: Duration,

    /// Language of fixed answers
    pub locale: Locale,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            routing: RoutingPolicy::default(),
            gateway_timeout: Duration::from_secs(60),
            locale: Locale::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools to \
look up data before answering, and say so politely when the tools return no information. \
Answer in the language the user writes in.";

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Answer a single question with empty chat history
    pub async fn ask(&self, question: &str) -> Result<String> {
        let turn = self.run_turn(ConversationTurn::new(question)).await?;
        turn.into_final_answer()
            .ok_or_else(|| AgentError::NoAnswer("turn ended without an answer".into()))
    }

    /// Run a turn to `Done`. The returned turn carries every step and the
    /// committed answer.
    pub async fn run_turn(&self, mut turn: ConversationTurn) -> Result<ConversationTurn> {
        if turn.is_done() {
            return Err(AgentError::InvalidState(format!("turn {} already finished", turn.id)));
        }

        let mut state = TurnState::AwaitingModel;
        while state != TurnState::Done {
            tracing::trace!(turn = %turn.id, ?state, "transition");
            state = match state {
                TurnState::AwaitingModel => self.call_model(&mut turn).await?,
                TurnState::AwaitingToolResult => self.call_tools(&mut turn).await?,
                TurnState::Finalizing(source) => self.finalize(&mut turn, source)?,
                TurnState::Done => TurnState::Done,
            };
        }

        tracing::info!(
            turn = %turn.id,
            steps = turn.steps().len(),
            model_calls = turn.model_calls(),
            termination = ?turn.termination(),
            "Turn finished"
        );
        Ok(turn)
    }

    /// Model node: ask the gateway, append the reply, pick the next edge
    async fn call_model(&self, turn: &mut ConversationTurn) -> Result<TurnState> {
        if turn.model_calls() >= self.config.max_iterations {
            tracing::warn!(
                turn = %turn.id,
                max = self.config.max_iterations,
                "Iteration bound reached"
            );
            return Ok(TurnState::Finalizing(FinalizeSource::IterationLimit));
        }

        let messages = self.build_request(turn);
        let schemas = self.tools.schemas();
        let completion = self.complete(&messages, &schemas).await?;

        let utterance = ModelUtterance {
            text: completion.content,
            tool_calls: completion
                .tool_calls
                .into_iter()
                .map(|mut call| {
                    if call.id.is_none() {
                        call.id = Some(Uuid::new_v4().to_string());
                    }
                    call
                })
                .collect(),
            terminal: matches!(turn.last_step(), Some(Step::Tool(_))),
        };

        let route = self.config.routing.route(&utterance);
        tracing::debug!(
            turn = %turn.id,
            %route,
            tool_calls = utterance.tool_calls.len(),
            "Model replied"
        );
        turn.push_utterance(utterance);

        match route {
            Route::Continue => Ok(TurnState::AwaitingToolResult),
            Route::Finalize => Ok(TurnState::Finalizing(FinalizeSource::LastStep)),
            Route::End => {
                commit_last_step(turn, Termination::Relayed)?;
                Ok(TurnState::Done)
            }
        }
    }

    /// Tool node: dispatch every pending invocation in request order
    async fn call_tools(&self, turn: &mut ConversationTurn) -> Result<TurnState> {
        let calls = turn
            .last_utterance()
            .map(|u| u.tool_calls.clone())
            .filter(|calls| !calls.is_empty())
            .ok_or_else(|| AgentError::InvalidState("no pending tool invocation".into()))?;

        if calls.len() > 1 {
            tracing::debug!(turn = %turn.id, count = calls.len(), "Dispatching batched invocations");
        }

        for call in &calls {
            tracing::debug!(turn = %turn.id, tool = %call.name, "Executing tool");
            let result = self.tools.execute(call).await.inspect_err(|e| {
                tracing::warn!(turn = %turn.id, tool = %call.name, error = %e, "Tool dispatch failed");
            })?;
            turn.push_tool_result(result);
        }

        Ok(TurnState::AwaitingModel)
    }

    /// Finalizing node
    fn finalize(&self, turn: &mut ConversationTurn, source: FinalizeSource) -> Result<TurnState> {
        match source {
            FinalizeSource::LastStep => commit_last_step(turn, Termination::Finalized)?,
            FinalizeSource::IterationLimit => turn.commit(
                self.config.locale.could_not_complete().to_string(),
                Termination::IterationLimit,
            )?,
        }
        Ok(TurnState::Done)
    }

    /// System instruction, prior history, the query, then this turn's steps
    fn build_request(&self, turn: &ConversationTurn) -> Vec<Message> {
        let mut messages = Vec::with_capacity(turn.chat_history().len() + turn.steps().len() + 2);
        messages.push(Message::system(self.config.system_prompt.clone()));
        messages.extend(turn.chat_history().iter().cloned());
        messages.push(Message::user(turn.query()));
        messages.extend(turn.steps().iter().map(Step::to_message));
        messages
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Completion> {
        let timeout = self.config.gateway_timeout;
        let call = self.provider.complete(messages, tools, &self.config.generation);

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.inspect_err(|e| tracing::error!(error = %e, "Gateway call failed")),
            Err(_) => {
                tracing::error!(timeout_secs = timeout.as_secs(), "Gateway call timed out");
                Err(AgentError::GatewayTimeout(timeout.as_secs()))
            }
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Commit the last step's text, refusing blank content
fn commit_last_step(turn: &mut ConversationTurn, termination: Termination) -> Result<()> {
    let text = turn
        .last_step()
        .map(|s| s.text().to_string())
        .ok_or_else(|| AgentError::InvalidState("no step to commit".into()))?;

    if text.trim().is_empty() {
        return Err(AgentError::NoAnswer(format!(
            "turn {} ended with an empty reply",
            turn.id
        )));
    }

    turn.commit(text, termination)
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn routing(mut self, routing: RoutingPolicy) -> Self {
        self.config.routing = routing;
        self
    }

    pub const fn gateway_timeout(mut self, timeout: Duration) -> Self {
        self.config.gateway_timeout = timeout;
        self
    }

    pub const fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Initialization("language model provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::test_support::{CountingTool, ScriptedProvider, SlowProvider, call};

    fn agent(provider: Arc<ScriptedProvider>, tool: CountingTool) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(tool)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_greeting_routes_through_finalize() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text(
            "¡Hola! ¿En qué puedo ayudarte?",
        ))]));
        let tool = CountingTool::new("query_customer_master");
        let calls = tool.counter();
        let agent = agent(provider.clone(), tool);

        let turn = agent.run_turn(ConversationTurn::new("hola")).await.unwrap();

        assert_eq!(turn.final_answer(), Some("¡Hola! ¿En qué puedo ayudarte?"));
        assert_eq!(turn.termination(), Some(Termination::Finalized));
        assert_eq!(turn.steps().len(), 1);
        assert_eq!(provider.calls(), 1);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_tool_round_trip_relays() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::tool_use(vec![call("query_customer_master", "A100")])),
            Ok(Completion::text("Source: maestro\n| id_acuerdo |\n|:--|\n| A100 |")),
        ]));
        let tool = CountingTool::new("query_customer_master");
        let calls = tool.counter();
        let agent = agent(provider.clone(), tool);

        let turn = agent.run_turn(ConversationTurn::new("datos de A100")).await.unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(turn.steps().len(), 3);
        assert!(matches!(turn.steps()[1], Step::Tool(_)));
        assert_eq!(turn.termination(), Some(Termination::Relayed));
        assert_eq!(turn.final_answer(), Some(turn.last_step().unwrap().text()));

        // second request carries the tool call and its result
        let second = provider.request(1);
        let roles: Vec<Role> = second.iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::Tool]);
        assert_eq!(second[3].tool_call_id, second[2].tool_calls[0].id);
    }

    #[tokio::test]
    async fn test_request_includes_history_and_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("ok"))]));
        let agent = agent(provider.clone(), CountingTool::new("query_field_activities"));

        let turn = ConversationTurn::new("y sus actividades?")
            .with_history(vec![Message::user("hola"), Message::assistant("hola!")]);
        agent.run_turn(turn).await.unwrap();

        let request = provider.request(0);
        assert_eq!(request[0].role, Role::System);
        assert_eq!(request[1].content, "hola");
        assert_eq!(request[2].content, "hola!");
        assert_eq!(request[3].content, "y sus actividades?");
        assert_eq!(provider.advertised_tools(0), vec!["query_field_activities".to_string()]);
    }

    #[tokio::test]
    async fn test_batched_calls_dispatch_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::tool_use(vec![
                call("query_customer_master", "A1"),
                call("query_customer_master", "A2"),
            ])),
            Ok(Completion::text("listo")),
        ]));
        let tool = CountingTool::new("query_customer_master");
        let calls = tool.counter();
        let agent = agent(provider, tool);

        let turn = agent.run_turn(ConversationTurn::new("A1 y A2")).await.unwrap();

        assert_eq!(calls.get(), 2);
        let outputs: Vec<&str> = turn.tool_results().map(|r| r.output.as_str()).collect();
        assert_eq!(outputs, vec!["Source: counting\nA1", "Source: counting\nA2"]);
    }

    #[tokio::test]
    async fn test_iteration_bound() {
        let replies = (0..5)
            .map(|_| Ok(Completion::tool_use(vec![call("query_customer_master", "A1")])))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(replies));
        let tool = CountingTool::new("query_customer_master");
        let calls = tool.counter();
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(tool)
            .max_iterations(3)
            .build()
            .unwrap();

        let turn = agent.run_turn(ConversationTurn::new("loop")).await.unwrap();

        assert_eq!(provider.calls(), 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(turn.termination(), Some(Termination::IterationLimit));
        assert_eq!(turn.final_answer(), Some(Locale::En.could_not_complete()));
    }

    #[tokio::test]
    async fn test_unknown_tool_aborts_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::tool_use(vec![
            call("delete_everything", "A1"),
        ]))]));
        let agent = agent(provider.clone(), CountingTool::new("query_customer_master"));

        let err = agent.ask("borra todo").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::tool_use(vec![
            call("query_customer_master", "A1"),
        ]))]));
        let agent = agent(provider, CountingTool::failing("query_customer_master"));

        let err = agent.ask("A1").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ToolDispatch);
    }

    #[tokio::test]
    async fn test_gateway_error_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::GatewayUnavailable(
            "connection refused".into(),
        ))]));
        let agent = agent(provider, CountingTool::new("query_customer_master"));

        let err = agent.ask("hola").await.unwrap_err();
        assert!(matches!(err, AgentError::GatewayUnavailable(_)));
    }

    #[tokio::test]
    async fn test_gateway_timeout() {
        let agent = AgentBuilder::new()
            .provider(Arc::new(SlowProvider(Duration::from_millis(500))))
            .gateway_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = agent.ask("hola").await.unwrap_err();
        assert!(matches!(err, AgentError::GatewayTimeout(_)));
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("   "))]));
        let agent = agent(provider, CountingTool::new("query_customer_master"));

        let err = agent.ask("?").await.unwrap_err();
        assert!(matches!(err, AgentError::NoAnswer(_)));
    }

    #[tokio::test]
    async fn test_marker_policy_ends_on_marker_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text(
            "No information found for agreement ZZZ.",
        ))]));
        let agent = AgentBuilder::new()
            .provider(provider)
            .routing(RoutingPolicy::SourceMarkers(vec![
                "Source: ".into(),
                "No information found for agreement".into(),
            ]))
            .build()
            .unwrap();

        let turn = agent.run_turn(ConversationTurn::new("ZZZ")).await.unwrap();
        assert_eq!(turn.termination(), Some(Termination::Relayed));
        assert_eq!(turn.final_answer(), Some("No information found for agreement ZZZ."));
    }

    #[tokio::test]
    async fn test_finished_turn_rejected() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("hi"))]));
        let agent = agent(provider, CountingTool::new("query_customer_master"));

        let done = agent.run_turn(ConversationTurn::new("hi")).await.unwrap();
        let err = agent.run_turn(done).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_concurrent_turns_are_independent() {
        let agent = Arc::new(
            AgentBuilder::new()
                .provider(Arc::new(crate::test_support::EchoProvider))
                .build()
                .unwrap(),
        );

        let questions = ["uno", "dos", "tres", "cuatro"];
        let answers = futures::future::join_all(questions.iter().map(|q| {
            let agent = agent.clone();
            async move { agent.ask(q).await.unwrap() }
        }))
        .await;

        assert_eq!(answers, vec!["uno", "dos", "tres", "cuatro"]);
    }

    #[tokio::test]
    async fn test_default_prompt_asks_for_user_language() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("hi"))]));
        let agent = AgentBuilder::new().provider(provider.clone()).build().unwrap();

        agent.ask("hola").await.unwrap();

        let system = &provider.request(0)[0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("Answer in the language the user writes in."));
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = AgentBuilder::new().build().err().unwrap();
        assert!(matches!(err, AgentError::Initialization(_)));
    }
}
