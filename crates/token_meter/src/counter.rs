//! Model-aware token counting.
//!
//! Resolves a model-specific BPE encoding via tiktoken, with an explicit and
//! total fallback table for model identifiers tiktoken does not know. The
//! per-message costing here mirrors the OpenAI chat-format overhead model:
//! it is a conservative approximation, but deterministic and monotonic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chat_core::Message;
use tiktoken_rs::CoreBPE;

/// Per-message framing overhead, in token-units.
const TOKENS_PER_MESSAGE: usize = 3;
/// Extra overhead when a message carries a `name` field.
const TOKENS_PER_NAME: usize = 1;
/// Reply-priming overhead added once per message list.
const TOKENS_PER_REPLY: usize = 3;

/// Fallback encodings for models tiktoken cannot resolve, checked in order
/// by identifier prefix. Older GPT-4/3.5 era names map to `cl100k_base`;
/// everything else gets the generic `o200k_base` default. Extend by adding
/// rows; call sites never change.
const FALLBACK_ENCODINGS: &[(&str, &str)] = &[("gpt-4", "cl100k_base"), ("gpt-3.5", "cl100k_base")];
const DEFAULT_FALLBACK_ENCODING: &str = "o200k_base";

fn fallback_encoding_name(model: &str) -> &'static str {
    FALLBACK_ENCODINGS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, encoding)| *encoding)
        .unwrap_or(DEFAULT_FALLBACK_ENCODING)
}

fn load_encoding(name: &str) -> CoreBPE {
    // The encoding tables ship inside the tiktoken-rs crate; constructing
    // them cannot fail at runtime.
    match name {
        "cl100k_base" => tiktoken_rs::cl100k_base().expect("embedded cl100k_base tables"),
        _ => tiktoken_rs::o200k_base().expect("embedded o200k_base tables"),
    }
}

/// Counts tokens for a given model identifier, caching resolved encodings.
#[derive(Default)]
pub struct TokenCounter {
    encodings: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoding handle for `model`. Unknown identifiers resolve through the
    /// fallback table, so this is total: it never fails for any model string.
    pub fn encoding_for(&self, model: &str) -> Arc<CoreBPE> {
        let mut cache = self.encodings.lock().expect("encoding cache poisoned");
        if let Some(bpe) = cache.get(model) {
            return Arc::clone(bpe);
        }

        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Arc::new(bpe),
            Err(_) => {
                let fallback = fallback_encoding_name(model);
                log::debug!("no encoding for model {model:?}, falling back to {fallback}");
                Arc::new(load_encoding(fallback))
            }
        };
        cache.insert(model.to_string(), Arc::clone(&bpe));
        bpe
    }

    /// Encoded length of `text` under the encoding resolved for `model`.
    pub fn count(&self, text: &str, model: &str) -> usize {
        self.encoding_for(model).encode_with_special_tokens(text).len()
    }

    /// Precise per-message costing of a message list, including chat-format
    /// framing overheads. Kept deliberately distinct from the coarse
    /// whole-transcript join used by the budget enforcer; this one is for
    /// introspection and usage reporting.
    pub fn count_messages(&self, messages: &[Message], model: &str) -> usize {
        let bpe = self.encoding_for(model);
        let mut total = TOKENS_PER_REPLY;
        for message in messages {
            total += TOKENS_PER_MESSAGE;
            total += bpe.encode_with_special_tokens(&message.content).len();
            if let Some(name) = &message.name {
                total += bpe.encode_with_special_tokens(name).len() + TOKENS_PER_NAME;
            }
        }
        total
    }
}
