//! Error types for anchor-agent

use anchor_heap::BootstrapError;
use thiserror::Error;

/// Errors that abort agent activation
#[derive(Error, Debug)]
pub enum AgentError {
    /// Environment or capability acquisition failed
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The agent options string could not be parsed
    #[error("invalid agent options: {0}")]
    InvalidOptions(String),
}

/// Result type alias for agent startup
pub type AgentResult<T> = Result<T, AgentError>;
