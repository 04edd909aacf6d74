//! services/api/src/adapters/claude.rs
//!
//! This module contains the adapter for the Anthropic Messages API.
//! It implements the `LlmProvider` port from the `core` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use studium_core::domain::ProviderKind;
use studium_core::ports::{InvokeParams, LlmProvider, ProviderError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LlmProvider` against the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ClaudeAdapter {
    /// Creates a new `ClaudeAdapter`. The base URL is injectable so tests can
    /// point the adapter at a local stub.
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

//=========================================================================================
// `LlmProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl LlmProvider for ClaudeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn invoke(&self, prompt: &str, params: &InvokeParams) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(format!("anthropic returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!(
                "anthropic returned {status}: {body}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        // The first content block carries the generated text.
        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| {
                ProviderError::Transport("anthropic response contained no content blocks".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let adapter = ClaudeAdapter::new(
            "https://api.anthropic.com/",
            "sk-ant-api03-test".into(),
            "claude-sonnet-4-20250514".into(),
        );
        assert_eq!(adapter.base_url, "https://api.anthropic.com");
        assert_eq!(adapter.kind(), ProviderKind::Claude);
    }

    #[test]
    fn request_body_matches_messages_api_shape() {
        let body = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 1000,
            temperature: 0.7,
            messages: vec![Message { role: "user", content: "Hola" }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hola");
    }

    #[test]
    fn response_text_comes_from_first_content_block() {
        let raw = r#"{"content":[{"type":"text","text":"{\"tarjetas\":[]}"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text, r#"{"tarjetas":[]}"#);
    }
}
