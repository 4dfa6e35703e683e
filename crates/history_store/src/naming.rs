//! Resource naming: timestamp placeholders and content-derived slugs.

use chrono::Local;

/// Prefix of freshly created resource names. A name still carrying this
/// prefix has never been descriptively renamed, which is what makes the
/// rename a one-time operation.
pub const PLACEHOLDER_PREFIX: &str = "chat_";

/// Fallback slug when sanitization leaves nothing usable.
const DEFAULT_SLUG: &str = "chat";

/// Slugs are truncated to this many characters.
const MAX_SLUG_LEN: usize = 50;

/// Timestamp-derived placeholder name, second resolution.
pub fn placeholder_name() -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Reduce model output to a filesystem-safe slug: every character that is
/// not ASCII alphanumeric becomes an underscore, runs collapse to one,
/// leading/trailing underscores are stripped, and the result is capped at
/// 50 characters (falling back to `"chat"` when nothing remains).
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::new();
    let mut last_was_underscore = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            slug.push('_');
            last_was_underscore = true;
        }
    }

    let trimmed: String = slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect();
    let trimmed = trimmed.trim_matches('_').to_string();
    if trimmed.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        trimmed
    }
}
