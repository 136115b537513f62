//! Conversation Turn
//!
//! State for one question-to-answer cycle. Only the state machine in
//! [`crate::reasoning`] appends steps or commits the final answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::{ToolCall, ToolResult};

/// A reply from the model, as appended to the turn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelUtterance {
    pub text: String,

    /// Pending invocations, dispatched in order
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Set by the model node when this reply directly follows tool output,
    /// i.e. the model is relaying looked-up data.
    #[serde(default)]
    pub terminal: bool,
}

impl ModelUtterance {
    pub fn has_pending_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One message produced within the current turn
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Model(ModelUtterance),
    Tool(ToolResult),
}

impl Step {
    pub fn text(&self) -> &str {
        match self {
            Self::Model(u) => &u.text,
            Self::Tool(r) => &r.output,
        }
    }

    /// Gateway representation of this step
    pub fn to_message(&self) -> Message {
        match self {
            Self::Model(u) => Message::assistant_with_calls(u.text.clone(), u.tool_calls.clone()),
            Self::Tool(r) => Message::tool(r.output.clone(), r.id.clone()),
        }
    }
}

/// Where the machine currently is within a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModel,
    AwaitingToolResult,
    Finalizing(FinalizeSource),
    Done,
}

/// What the Finalizing node commits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizeSource {
    /// Text of the last appended step
    LastStep,
    /// Fixed "could not complete" sentence
    IterationLimit,
}

/// How a finished turn reached `Done`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Routed `end`: the last utterance was committed verbatim
    Relayed,
    /// Routed `finalize` through the Finalizing node
    Finalized,
    /// Iteration bound exhausted
    IterationLimit,
}

/// Unit of work for one incoming question
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    query: String,
    chat_history: Vec<Message>,
    steps: Vec<Step>,
    final_answer: Option<String>,
    termination: Option<Termination>,
    model_calls: usize,
    pub started_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Fresh turn with empty history
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            chat_history: Vec::new(),
            steps: Vec::new(),
            final_answer: None,
            termination: None,
            model_calls: 0,
            started_at: Utc::now(),
        }
    }

    /// Attach prior-turn messages
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.chat_history = history;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn chat_history(&self) -> &[Message] {
        &self.chat_history
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Last step if it is a model reply
    pub fn last_utterance(&self) -> Option<&ModelUtterance> {
        match self.steps.last() {
            Some(Step::Model(u)) => Some(u),
            _ => None,
        }
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.steps.iter().filter_map(|s| match s {
            Step::Tool(r) => Some(r),
            Step::Model(_) => None,
        })
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub const fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub const fn is_done(&self) -> bool {
        self.final_answer.is_some()
    }

    pub const fn model_calls(&self) -> usize {
        self.model_calls
    }

    /// Consume the turn, yielding the committed answer
    pub fn into_final_answer(self) -> Option<String> {
        self.final_answer
    }

    pub(crate) fn push_utterance(&mut self, utterance: ModelUtterance) {
        self.model_calls += 1;
        self.steps.push(Step::Model(utterance));
    }

    pub(crate) fn push_tool_result(&mut self, result: ToolResult) {
        self.steps.push(Step::Tool(result));
    }

    /// Commit the final answer. A second commit is an invariant violation.
    pub(crate) fn commit(&mut self, answer: String, termination: Termination) -> Result<()> {
        if self.final_answer.is_some() {
            return Err(AgentError::InvalidState(format!(
                "final answer already set for turn {}",
                self.id
            )));
        }
        self.final_answer = Some(answer);
        self.termination = Some(termination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(text: &str) -> ModelUtterance {
        ModelUtterance {
            text: text.into(),
            tool_calls: Vec::new(),
            terminal: false,
        }
    }

    #[test]
    fn test_new_turn_is_empty() {
        let turn = ConversationTurn::new("¿Cuánto consumió A100?");
        assert!(turn.steps().is_empty());
        assert!(turn.chat_history().is_empty());
        assert!(turn.final_answer().is_none());
        assert!(!turn.is_done());
    }

    #[test]
    fn test_commit_once() {
        let mut turn = ConversationTurn::new("hi");
        turn.push_utterance(utterance("Hello!"));
        turn.commit("Hello!".into(), Termination::Finalized).unwrap();

        let err = turn.commit("again".into(), Termination::Relayed).unwrap_err();
        assert!(matches!(err, AgentError::InvalidState(_)));
        assert_eq!(turn.final_answer(), Some("Hello!"));
        assert_eq!(turn.termination(), Some(Termination::Finalized));
    }

    #[test]
    fn test_step_messages() {
        let mut turn = ConversationTurn::new("q");
        turn.push_utterance(ModelUtterance {
            text: String::new(),
            tool_calls: vec![ToolCall::new("query_customer_master").with_id("c1")],
            terminal: false,
        });
        turn.push_tool_result(ToolResult::found("query_customer_master", "Source: maestro").with_id("c1"));

        let messages: Vec<Message> = turn.steps().iter().map(Step::to_message).collect();
        assert_eq!(messages[0].tool_calls.len(), 1);
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(turn.tool_results().count(), 1);
        assert!(turn.last_utterance().is_none());
        assert_eq!(turn.model_calls(), 1);
    }
}
