use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response contained no completion choices")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, LlmError>;
