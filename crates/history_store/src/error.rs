use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryStoreError>;
