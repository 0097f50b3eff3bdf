//! Model client trait, errors, and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::Message;

/// The external model: full history in, one assistant text out
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Single completion request (blocking until the response arrives)
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Errors that can occur while talking to the model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed ({status}): check the API key")]
    Auth { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No scripted response left")]
    Exhausted,
}

/// Scripted model for tests and dry runs
///
/// Returns queued responses in order and remembers every history it was sent.
#[derive(Debug, Default)]
pub struct MockModelClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockModelClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Histories sent so far, one per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        self.responses
            .lock()
            .map_err(|e| ModelError::Request(e.to_string()))?
            .pop_front()
            .ok_or(ModelError::Exhausted)
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
