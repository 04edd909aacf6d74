//! services/api/src/adapters/openai.rs
//!
//! This module contains the adapter for the OpenAI chat-completions API.
//! It implements the `LlmProvider` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;

use studium_core::domain::ProviderKind;
use studium_core::ports::{InvokeParams, LlmProvider, ProviderError};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LlmProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdapter {
    /// Creates a new `OpenAiAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

// Credential problems surface as API errors with well-known markers; map
// those to `Auth` so diagnostics distinguish them, everything else to
// `Transport`. Both collapse to "attempt failed" for failover purposes.
fn map_openai_error(e: OpenAIError) -> ProviderError {
    let text = e.to_string();
    if text.contains("invalid_api_key")
        || text.contains("Incorrect API key")
        || text.contains("authentication")
    {
        ProviderError::Auth(text)
    } else {
        ProviderError::Transport(text)
    }
}

//=========================================================================================
// `LlmProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl LlmProvider for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn invoke(&self, prompt: &str, params: &InvokeParams) -> Result<String, ProviderError> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(map_openai_error)?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(params.max_tokens)
            .temperature(params.temperature)
            .n(1)
            .build()
            .map_err(map_openai_error)?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(ProviderError::Transport(
                    "OpenAI response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(ProviderError::Transport(
                "OpenAI returned no choices in its response.".to_string(),
            ))
        }
    }
}
