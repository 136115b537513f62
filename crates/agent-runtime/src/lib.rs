//! # agent-runtime
//!
//! Gateway providers for the agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): Chat Completions with native tool binding. Also
//!   serves any OpenAI-compatible endpoint, including a local Ollama at
//!   `http://localhost:11434/v1`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry};
