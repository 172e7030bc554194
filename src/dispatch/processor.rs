//! Command-processor boundary and the HTTP agent client.
//!
//! [`AgentClient`] posts the spoken command to any OpenAI-compatible
//! `/v1/chat/completions` endpoint, with the configured agent instructions as
//! the system message.  All connection details come from [`AgentConfig`];
//! nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AgentConfig;

// ---------------------------------------------------------------------------
// CommandError
// ---------------------------------------------------------------------------

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("agent request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse agent response: {0}")]
    Parse(String),

    /// The agent returned a response with no usable text content.
    #[error("agent returned an empty reply")]
    EmptyReply,
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CommandError::Timeout
        } else {
            CommandError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CommandProcessor trait
// ---------------------------------------------------------------------------

/// Async boundary to the downstream command processor.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn CommandProcessor>`.  The dispatch loop guarantees `process` is
/// never invoked concurrently with itself.
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    /// Run one spoken command and return the agent's reply.
    async fn process(&self, text: &str) -> Result<String, CommandError>;
}

// ---------------------------------------------------------------------------
// AgentClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with any provider that speaks the OpenAI chat-completions wire
/// format — OpenAI, Groq, LM Studio, vLLM, Ollama in OpenAI mode.
pub struct AgentClient {
    client: reqwest::Client,
    config: AgentConfig,
}

impl AgentClient {
    /// Build an `AgentClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is the
    /// last-resort fallback if the builder fails.
    pub fn from_config(config: &AgentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl CommandProcessor for AgentClient {
    /// Send `text` to the configured endpoint as the user message, with the
    /// agent instructions as the system message.
    ///
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string — local providers need none.
    async fn process(&self, text: &str) -> Result<String, CommandError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.instructions },
                { "role": "user",   "content": text }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CommandError::Parse(e.to_string()))?;

        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(CommandError::EmptyReply)?
            .trim()
            .to_string();

        if reply.is_empty() {
            return Err(CommandError::EmptyReply);
        }

        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> AgentConfig {
        AgentConfig {
            base_url: "http://localhost:11434".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "gpt-4o-mini".into(),
            instructions: "Run the command.".into(),
            temperature: 0.2,
            timeout_secs: 10,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _client = AgentClient::from_config(&make_config(None));
        let _client = AgentClient::from_config(&make_config(Some("")));
        let _client = AgentClient::from_config(&make_config(Some("sk-test-1234")));
    }

    /// Verify that `AgentClient` is usable as `dyn CommandProcessor`.
    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn CommandProcessor> =
            Box::new(AgentClient::from_config(&make_config(None)));
        drop(client);
    }

    #[test]
    fn timeout_errors_map_to_timeout_variant() {
        // CommandError::from is exercised indirectly via reqwest in
        // production; here we at least pin the display strings the dispatch
        // loop logs.
        assert!(CommandError::Timeout.to_string().contains("timed out"));
        assert!(CommandError::EmptyReply.to_string().contains("empty"));
    }
}
