//! # agent-core
//!
//! Agent control loop with a provider-agnostic gateway and an extensible
//! tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        AgentService                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │ State Machine│  │    Tools     │  │    LlmProvider     │  │
//! │  │  + Routing   │──│   Registry   │──│    (Strategy)      │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every question becomes a [`ConversationTurn`] that the [`Agent`] drives to
//! a single final answer. The gateway and the tools are injected at
//! construction, so tests substitute scripted fakes.

pub mod error;
pub mod locale;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod routing;
pub mod service;
pub mod tool;
pub mod turn;

#[cfg(test)]
mod test_support;

pub use error::{AgentError, ErrorKind, Result};
pub use locale::Locale;
pub use message::{Message, Role};
pub use provider::LlmProvider;
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use routing::{Route, RoutingPolicy};
pub use service::{AgentService, Reply, ReplyStatus};
pub use tool::{Tool, ToolCall, ToolOutcome, ToolRegistry, ToolResult, ToolSchema};
pub use turn::{ConversationTurn, ModelUtterance, Step, Termination, TurnState};
