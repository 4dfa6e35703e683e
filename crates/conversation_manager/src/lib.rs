//! Conversation session engine.
//!
//! Orchestrates the transcript store, token budget, persona registry,
//! persistence layer, and the remote completion endpoint behind a small
//! synchronous-per-turn API. See [`ConversationManager`].

pub mod config;
pub mod error;
pub mod manager;

pub use chat_core::{Message, PersonaRegistry, Role, Transcript, CUSTOM_PERSONA};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use manager::{CompletionOverrides, ConversationManager, SessionOptions};
