use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Ordered log of role-tagged messages, insertion order significant.
///
/// Invariant: at most one entry has role `system`, and the engine only ever
/// places it at index 0. Serializes transparently as a JSON array of
/// messages, which is exactly the backing-resource format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The system entry, if one exists.
    pub fn system(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == Role::System)
    }

    /// Replace the content of the existing system entry, or insert a new one
    /// at index 0. At most one system entry exists afterwards.
    pub fn upsert_system(&mut self, content: impl Into<String>) {
        let content = content.into();
        match self.messages.iter_mut().find(|m| m.role == Role::System) {
            Some(existing) => existing.content = content,
            None => self.messages.insert(0, Message::system(content)),
        }
    }

    /// Remove the oldest evictable entry: index 1, which is the oldest
    /// message after the pinned slot at index 0. Returns `None` when one or
    /// fewer messages remain, so a non-empty transcript is never drained and
    /// index 0 is never removed.
    pub fn evict_oldest(&mut self) -> Option<Message> {
        if self.messages.len() > 1 {
            Some(self.messages.remove(1))
        } else {
            None
        }
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::from(vec![
            Message::system("be terse"),
            Message::user("hi"),
            Message::assistant("hello"),
        ])
    }

    #[test]
    fn upsert_replaces_existing_system_in_place() {
        let mut t = sample();
        t.upsert_system("be verbose");
        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[0].role, Role::System);
        assert_eq!(t.messages()[0].content, "be verbose");
        assert_eq!(t.messages()[1].content, "hi");
    }

    #[test]
    fn upsert_inserts_at_front_without_disturbing_order() {
        let mut t = Transcript::from(vec![Message::user("hi"), Message::assistant("hello")]);
        t.upsert_system("be terse");
        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[0].role, Role::System);
        assert_eq!(t.messages()[1].content, "hi");
        assert_eq!(t.messages()[2].content, "hello");
    }

    #[test]
    fn upsert_keeps_exactly_one_system_entry() {
        let mut t = sample();
        t.upsert_system("a");
        t.upsert_system("b");
        let count = t.messages().iter().filter(|m| m.role == Role::System).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn evict_removes_index_one() {
        let mut t = sample();
        let evicted = t.evict_oldest().unwrap();
        assert_eq!(evicted.content, "hi");
        assert_eq!(t.messages()[0].role, Role::System);
    }

    #[test]
    fn evict_never_drains_last_message() {
        let mut t = Transcript::from(vec![Message::system("pinned")]);
        assert!(t.evict_oldest().is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn serializes_as_bare_array() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with('['));
        let back: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
