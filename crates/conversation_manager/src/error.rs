//! Session error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing or unusable credential at construction. Fatal, no retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown or reserved persona name. The transcript is untouched.
    #[error("unknown or reserved persona: {0}")]
    InvalidPersona(String),

    /// Rejected caller input (e.g. a blank custom system message). The
    /// transcript is untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The completion RPC failed. The already-appended user message is
    /// retained; there is no rollback.
    #[error(transparent)]
    Remote(#[from] llm_client::LlmError),

    /// A persistence write failed. Reads never surface here: a missing or
    /// corrupt history loads as an empty transcript.
    #[error(transparent)]
    Persistence(#[from] history_store::HistoryStoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
