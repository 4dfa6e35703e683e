//! Token budget management for the conversation engine.
//!
//! Two deliberately different costing rules live here:
//!
//! - [`counter`]: precise per-message costing with chat-format overheads,
//!   used for introspection and usage reporting.
//! - [`enforcer`]: coarse whole-transcript costing that drives eviction.

pub mod counter;
pub mod enforcer;

pub use counter::TokenCounter;
pub use enforcer::enforce_budget;
