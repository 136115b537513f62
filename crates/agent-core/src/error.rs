//! Error Types

use thiserror::Error;

use crate::locale::Locale;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Coarse failure classes surfaced to the request boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The agent never became available (e.g. missing credential)
    Initialization,
    /// The language-model call failed, was rejected, or timed out
    Gateway,
    /// Unknown tool, invalid arguments, or an unreachable store
    ToolDispatch,
    /// The loop finished without recognizable final content
    NoAnswer,
    /// Broken invariant inside the state machine
    Internal,
}

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Agent could not be constructed
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Gateway returned an error or an unusable response
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Gateway unreachable
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Gateway did not answer within the configured timeout
    #[error("Gateway timed out after {0}s")]
    GatewayTimeout(u64),

    /// Gateway rejected the credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the gateway
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// No final answer could be produced
    #[error("No answer produced: {0}")]
    NoAnswer(String),

    /// Turn state invariant violated
    #[error("Invalid turn state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Classify the error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Initialization(_) | Self::Config(_) => ErrorKind::Initialization,
            Self::Gateway(_)
            | Self::GatewayUnavailable(_)
            | Self::GatewayTimeout(_)
            | Self::Auth(_)
            | Self::RateLimited(_)
            | Self::Json(_) => ErrorKind::Gateway,
            Self::ToolNotFound(_) | Self::ToolValidation(_) | Self::ToolExecution(_) => {
                ErrorKind::ToolDispatch
            }
            Self::NoAnswer(_) => ErrorKind::NoAnswer,
            Self::InvalidState(_) => ErrorKind::Internal,
        }
    }

    /// Convert to a user-facing sentence. Never exposes internal detail.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        match self.kind() {
            ErrorKind::Initialization => locale.initialization_failure(),
            ErrorKind::NoAnswer => locale.fallback_answer(),
            ErrorKind::Gateway | ErrorKind::ToolDispatch | ErrorKind::Internal => {
                locale.generic_failure()
            }
        }
    }
}
