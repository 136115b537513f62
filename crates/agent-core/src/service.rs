//! Request Service
//!
//! Converts a raw question into a fresh turn and the finished turn into a
//! user-facing reply. Internal errors never cross this boundary.

use serde::Serialize;

use crate::error::{ErrorKind, Result};
use crate::locale::Locale;
use crate::reasoning::Agent;
use crate::turn::{ConversationTurn, Termination};

/// How a reply was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    /// Final answer from the turn
    Answered,
    /// Turn produced no usable content
    Fallback,
    /// Gateway or tool failure
    Failed,
    /// Agent never initialized
    Unavailable,
}

/// Reply handed to the transport layer
#[derive(Clone, Debug, Serialize)]
pub struct Reply {
    pub text: String,
    pub status: ReplyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
}

impl Reply {
    fn fixed(text: &str, status: ReplyStatus) -> Self {
        Self {
            text: text.to_string(),
            status,
            termination: None,
        }
    }
}

/// Front door to the agent. Holds the initialization failure, if any, so
/// every request can fail fast without touching the gateway or the tools.
pub struct AgentService {
    agent: Result<Agent>,
    locale: Locale,
}

impl AgentService {
    /// Wrap a successfully built agent
    pub fn new(agent: Agent) -> Self {
        let locale = agent.config().locale;
        Self {
            agent: Ok(agent),
            locale,
        }
    }

    /// Wrap the outcome of agent construction
    pub fn from_build(agent: Result<Agent>, locale: Locale) -> Self {
        match agent {
            Ok(agent) => Self::new(agent),
            Err(err) => {
                tracing::error!(error = %err, "Failed to initialize agent");
                Self {
                    agent: Err(err),
                    locale,
                }
            }
        }
    }

    pub const fn is_ready(&self) -> bool {
        self.agent.is_ok()
    }

    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Answer one question with empty chat history
    pub async fn answer(&self, query: &str) -> Reply {
        let agent = match &self.agent {
            Ok(agent) => agent,
            Err(_) => {
                return Reply::fixed(self.locale.initialization_failure(), ReplyStatus::Unavailable);
            }
        };

        match agent.run_turn(ConversationTurn::new(query)).await {
            Ok(turn) => {
                let termination = turn.termination();
                match turn.into_final_answer() {
                    Some(text) => Reply {
                        text,
                        status: ReplyStatus::Answered,
                        termination,
                    },
                    None => Reply::fixed(self.locale.fallback_answer(), ReplyStatus::Fallback),
                }
            }
            Err(err) if err.kind() == ErrorKind::NoAnswer => {
                tracing::warn!(error = %err, "No answer produced");
                Reply::fixed(err.user_message(self.locale), ReplyStatus::Fallback)
            }
            Err(err) => {
                tracing::error!(error = %err, kind = ?err.kind(), "Turn aborted");
                Reply::fixed(err.user_message(self.locale), ReplyStatus::Failed)
            }
        }
    }
}
