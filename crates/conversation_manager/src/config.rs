//! Session configuration, immutable after construction.

use std::path::PathBuf;

use history_store::default_history_dir;
use llm_client::OPENAI_API_BASE;

use crate::error::{Result, SessionError};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TOKEN_BUDGET: usize = 4096;

/// Everything a session needs up front: the credential, the endpoint, model
/// defaults, the budget ceiling, and where histories live.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub default_temperature: f64,
    pub default_max_tokens: Option<u32>,
    pub token_budget: usize,
    pub history_dir: PathBuf,
}

impl SessionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: Some(DEFAULT_MAX_TOKENS),
            token_budget: DEFAULT_TOKEN_BUDGET,
            history_dir: default_history_dir(),
        }
    }

    /// Build from `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL`
    /// (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SessionError::Configuration("OPENAI_API_KEY is not set".to_string())
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.default_temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = dir.into();
        self
    }
}
