mod client;
pub(crate) mod types;

use tracing::debug;

use crate::error::{AiError, Result};
use client::OpenAiClient;

// =============================================================================
// OpenAi Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Single-prompt completion with a hard output bound.
    pub async fn complete_bounded(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let request = types::ChatRequest::new(&self.model)
            .message(types::WireMessage::user(prompt))
            .output_limit(max_output_tokens);

        self.send(&request).await
    }

    async fn send(&self, request: &types::ChatRequest) -> Result<String> {
        let response = self.client().chat(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::EmptyResponse(self.model.clone()))?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            debug!(model = %self.model, finish_reason = reason, "OpenAI completion finished");
        }

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiError::EmptyResponse(self.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4o");
        assert_eq!(ai.model, "gpt-4o");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.base_url, None);
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4o").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }
}
