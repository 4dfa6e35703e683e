//! Core data model for the conversation engine: messages, the ordered
//! transcript, and the persona registry.

pub mod message;
pub mod persona;
pub mod transcript;

pub use message::{Message, Role};
pub use persona::{PersonaRegistry, CUSTOM_PERSONA};
pub use transcript::Transcript;
