mod client;
pub(crate) mod types;

use std::time::Duration;

use crate::error::{AiError, Result};

use client::OpenAiClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Sampling parameters sent with every chat request. Unset fields are left
/// to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sampling {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub n: Option<u32>,
    pub stop: Vec<String>,
}

// =============================================================================
// OpenAi
// =============================================================================

/// Chat completions against any OpenAI-compatible endpoint (OpenAI, Groq,
/// OpenRouter, local gateways). Cheap to clone: the HTTP client is a
/// pooled handle.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
    sampling: Sampling,
    timeout: Option<Duration>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http: reqwest::Client::new(),
            sampling: Sampling::default(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Share an existing connection pool instead of the private one.
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Per-request timeout, applied on top of any client-wide timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> OpenAiClient<'_> {
        OpenAiClient::new(&self.api_key, &self.http, &self.base_url).with_timeout(self.timeout)
    }

    /// Single-turn chat completion. Returns the trimmed text of the first
    /// choice.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = types::ChatRequest::new(&self.model)
            .message(types::WireMessage::system(system))
            .message(types::WireMessage::user(user))
            .sampling(&self.sampling);

        let response = self.client().chat(&request).await?;

        response
            .first_content()
            .map(|content| content.trim().to_string())
            .ok_or(AiError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_openai() {
        let ai = OpenAi::new("sk-test", "gpt-4o");
        assert_eq!(ai.model(), "gpt-4o");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.base_url(), OPENAI_API_URL);
        assert_eq!(ai.sampling, Sampling::default());
        assert!(ai.timeout.is_none());
    }

    #[test]
    fn builder_overrides() {
        let ai = OpenAi::new("gsk-test", "llama-3.3-70b-versatile")
            .with_base_url("https://api.groq.com/openai/v1")
            .with_timeout(Duration::from_secs(30))
            .with_sampling(Sampling {
                temperature: Some(0.75),
                ..Sampling::default()
            });
        assert_eq!(ai.base_url(), "https://api.groq.com/openai/v1");
        assert_eq!(ai.timeout, Some(Duration::from_secs(30)));
        assert_eq!(ai.sampling.temperature, Some(0.75));
    }

    #[test]
    fn unreachable_endpoint_is_network_error() {
        let ai = OpenAi::new("sk-test", "gpt-4o")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));

        let result = tokio_test::block_on(ai.chat_completion("Score tone.", "hello"));
        assert!(matches!(
            result,
            Err(AiError::Network(_)) | Err(AiError::Timeout(_))
        ));
    }
}
