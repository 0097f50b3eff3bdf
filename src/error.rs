//! Error types for codeagent
//!
//! Centralized error handling using thiserror. Tool faults never surface
//! here; they are folded into `ToolResult`s by the dispatcher.

use thiserror::Error;

use crate::interaction::InteractionError;
use crate::llm::ModelError;

/// Errors that halt an agent run
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model interface failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The operator interaction channel failed
    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration could not be used
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
