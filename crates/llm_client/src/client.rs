use crate::api::{ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Handle to an OpenAI-compatible completion endpoint. Owns one HTTP
/// connection pool; callers keep a single instance per session and reuse it.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Issue a blocking (from the caller's perspective) completion request
    /// and return the trimmed assistant text.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<String> {
        log::debug!(
            "chat completion: model={} messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(LlmError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}
