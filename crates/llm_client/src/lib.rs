//! Client for the remote completion endpoint, treated by the engine as an
//! opaque request/response RPC.

pub mod api;
pub mod client;
pub mod error;

pub use api::{ChatRequest, ChatResponse};
pub use client::{ChatClient, OPENAI_API_BASE};
pub use error::{LlmError, Result};
