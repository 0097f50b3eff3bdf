//! OpenAI-compatible chat completions client
//!
//! Sends the whole history on every call and returns the first choice's text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::{ModelClient, ModelError};
use super::types::Message;
use crate::config::LlmConfig;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for the OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 2000,
            timeout: Duration::from_secs(300),
        }
    }
}

impl From<&LlmConfig> for OpenAiConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            model: llm.model.clone(),
            base_url: llm.base_url.clone(),
            temperature: llm.temperature,
            top_p: llm.top_p,
            max_tokens: llm.max_tokens,
            timeout: Duration::from_millis(llm.timeout_ms),
        }
    }
}

/// OpenAI-compatible API client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a client reading the key from `api_key_env`
    pub fn from_env(api_key_env: &str, config: OpenAiConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelError::MissingApiKey {
                env_var: api_key_env.to_string(),
            })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the chat completions API
    fn build_request(&self, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "content": m.content
                })
            })
            .collect();

        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens
        })
    }

    /// Pull the assistant text out of a chat completions response
    fn parse_response(body: &Value) -> Result<String, ModelError> {
        let message = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| ModelError::InvalidResponse("missing choices[0].message".to_string()))?;

        Ok(message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn send_request(&self, body: Value) -> Result<Value, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else {
                    ModelError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        log::debug!("chat completions response status: {}", status);

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let body = self.build_request(messages);
        let response = self.send_request(body).await?;
        Self::parse_response(&response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::with_api_key("test-key".to_string(), OpenAiConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 2000);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!((config.top_p - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_from_llm_config() {
        let llm = LlmConfig {
            model: "gpt-4o".to_string(),
            timeout_ms: 1500,
            ..LlmConfig::default()
        };
        let config = OpenAiConfig::from(&llm);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = OpenAiClient::from_env("CODEAGENT_TEST_KEY_THAT_IS_NEVER_SET", OpenAiConfig::default());
        assert!(matches!(result, Err(ModelError::MissingApiKey { .. })));
    }

    #[test]
    fn test_build_request() {
        let history = vec![Message::system("sys"), Message::user("task"), Message::assistant("reply")];
        let body = client().build_request(&history);

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "task");
        assert_eq!(body["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = OpenAiConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::with_api_key("k".to_string(), config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "<complete><result>ok</result></complete>"}}]
        });
        let text = OpenAiClient::parse_response(&body).unwrap();
        assert!(text.starts_with("<complete>"));
    }

    #[test]
    fn test_parse_response_null_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert_eq!(OpenAiClient::parse_response(&body).unwrap(), "");
    }

    #[test]
    fn test_parse_response_missing_choices() {
        let result = OpenAiClient::parse_response(&json!({}));
        assert!(matches!(result, Err(ModelError::InvalidResponse(_))));
    }
}
