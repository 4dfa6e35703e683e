//! Transcript budget enforcement by oldest-first eviction.

use chat_core::Transcript;

use crate::counter::TokenCounter;

/// Evict the oldest non-pinned entries until the transcript fits `ceiling`.
///
/// Costing here is intentionally coarse: all message contents are joined
/// with newlines and encoded as one string, without the per-message framing
/// overheads of [`TokenCounter::count_messages`]. The two rules stay
/// separate on purpose; the precise one is for introspection, this one
/// decides eviction.
///
/// Index 0 is never removed and a non-empty transcript is never drained, so
/// a pinned system message survives any ceiling.
pub fn enforce_budget(
    transcript: &mut Transcript,
    counter: &TokenCounter,
    model: &str,
    ceiling: usize,
) {
    while transcript.len() > 1 {
        if joined_tokens(transcript, counter, model) <= ceiling {
            break;
        }
        if let Some(evicted) = transcript.evict_oldest() {
            log::debug!(
                "budget ceiling {ceiling} exceeded, evicted {} message ({} chars)",
                evicted.role.as_str(),
                evicted.content.len()
            );
        }
    }
}

fn joined_tokens(transcript: &Transcript, counter: &TokenCounter, model: &str) -> usize {
    let joined = transcript
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    counter.count(&joined, model)
}
