//! Error Types for the Agreement Store

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Store failures abort the turn as tool-dispatch errors
impl From<StoreError> for AgentError {
    fn from(err: StoreError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}
