//! Test doubles for the gateway and the tool layer

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::{Message, Role};
use crate::provider::{Completion, GenerationOptions, LlmProvider, ProviderInfo};
use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

/// Invocation of `name` for agreement `id`
pub fn call(name: &str, id: &str) -> ToolCall {
    ToolCall::new(name).with_arg("agreement_id", id)
}

/// Replays queued replies and records every request
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<(Vec<Message>, Vec<String>)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Completion>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[index].0.clone()
    }

    pub fn advertised_tools(&self, index: usize) -> Vec<String> {
        self.requests.lock().unwrap()[index].1.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Scripted".into(),
            endpoint: "memory".into(),
            supports_tools: true,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests.lock().unwrap().push((
            messages.to_vec(),
            tools.iter().map(|t| t.name.clone()).collect(),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Gateway("script exhausted".into())))
    }
}

/// Replies with the text of the last user message
pub struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Echo".into(),
            endpoint: "memory".into(),
            supports_tools: false,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(Completion::text(last))
    }
}

/// Never answers within a reasonable timeout
pub struct SlowProvider(pub Duration);

#[async_trait]
impl LlmProvider for SlowProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Slow".into(),
            endpoint: "memory".into(),
            supports_tools: true,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        tokio::time::sleep(self.0).await;
        Ok(Completion::text("too late"))
    }
}

/// Shared invocation counter
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tool that counts invocations and echoes the agreement id
pub struct CountingTool {
    name: String,
    fail: bool,
    counter: Counter,
}

impl CountingTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fail: false,
            counter: Counter::default(),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn counter(&self) -> Counter {
        self.counter.clone()
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: "Counting lookup".into(),
            parameters: vec![ParameterSchema::required_string("agreement_id", "Agreement id")],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        self.counter.0.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AgentError::ToolExecution("store unreachable".into()));
        }
        let id = call.str_arg("agreement_id").unwrap_or_default();
        Ok(ToolResult::found(self.name.clone(), format!("Source: counting\n{id}")))
    }
}
