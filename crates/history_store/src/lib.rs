//! Persistence layer: transcripts as pretty-printed JSON files under a
//! dedicated storage directory, with timestamp placeholders and
//! content-derived renaming support.

pub mod error;
pub mod naming;
pub mod store;

pub use error::{HistoryStoreError, Result};
pub use naming::{placeholder_name, sanitize_slug, PLACEHOLDER_PREFIX};
pub use store::{default_history_dir, FileHistoryStore, HistoryStorage};
