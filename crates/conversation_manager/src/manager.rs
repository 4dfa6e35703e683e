//! The session orchestrator: owns the transcript, enforces the token
//! budget around every exchange, talks to the completion endpoint, and
//! persists after each turn.

use chat_core::{Message, PersonaRegistry, Role, Transcript, CUSTOM_PERSONA};
use history_store::{
    placeholder_name, sanitize_slug, FileHistoryStore, HistoryStorage, PLACEHOLDER_PREFIX,
};
use llm_client::{ChatClient, ChatRequest};
use token_meter::{enforce_budget, TokenCounter};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Excerpt size fed to the slug request, in token-units.
const EXCERPT_TOKEN_BUDGET: usize = 120;
/// Output cap for the slug request.
const SLUG_MAX_TOKENS: u32 = 16;

/// Construction-time choices: at most one of `persona` / `system_message`
/// is honored (an explicit custom message wins), and `history_name` resumes
/// an existing transcript instead of starting fresh.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub persona: Option<String>,
    pub system_message: Option<String>,
    pub history_name: Option<String>,
}

/// Per-call overrides for one completion round; unset fields fall back to
/// the session defaults.
#[derive(Debug, Clone, Default)]
pub struct CompletionOverrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// One logical conversation: transcript, persona registry, budget, and the
/// backing resource. Driven by a single caller; turn methods take
/// `&mut self`, so concurrent turns cannot be expressed.
pub struct ConversationManager {
    config: SessionConfig,
    personas: PersonaRegistry,
    counter: TokenCounter,
    store: FileHistoryStore,
    transcript: Transcript,
    history_name: String,
    system_message: Option<String>,
    active_persona: Option<String>,
    client: Option<ChatClient>,
}

impl std::fmt::Debug for ConversationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("history_name", &self.history_name)
            .field("active_persona", &self.active_persona)
            .finish_non_exhaustive()
    }
}

impl ConversationManager {
    /// Load-or-create a session. Validates the credential before touching
    /// any resource; nothing is written to disk until the first completion
    /// round or persona mutation.
    pub async fn open(config: SessionConfig, options: SessionOptions) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SessionError::Configuration(
                "no API credential provided".to_string(),
            ));
        }

        let mut personas = PersonaRegistry::new();
        let mut active_persona = None;

        let system_message = if let Some(text) = options.system_message {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(SessionError::InvalidInput(
                    "custom system message must not be empty".to_string(),
                ));
            }
            personas.set_custom(trimmed);
            active_persona = Some(CUSTOM_PERSONA.to_string());
            Some(trimmed.to_string())
        } else if let Some(name) = options.persona {
            let prompt = Self::lookup_persona(&personas, &name)?.to_string();
            active_persona = Some(name);
            Some(prompt)
        } else {
            None
        };

        let store = FileHistoryStore::new(config.history_dir.clone());
        let (history_name, mut transcript) = match options.history_name {
            Some(name) => {
                let transcript = store.load(&name).await;
                (name, transcript)
            }
            None => (store.unique_name(&placeholder_name()).await, Transcript::new()),
        };

        if let Some(text) = &system_message {
            transcript.upsert_system(text.clone());
        }

        Ok(Self {
            config,
            personas,
            counter: TokenCounter::new(),
            store,
            transcript,
            history_name,
            system_message,
            active_persona,
            client: None,
        })
    }

    /// One full exchange with the session defaults.
    pub async fn completion(&mut self, prompt: &str) -> Result<String> {
        self.completion_with(prompt, CompletionOverrides::default()).await
    }

    /// One full exchange: append the prompt, trim to budget, call the
    /// endpoint with the whole transcript, append the reply, trim again,
    /// persist. A failed remote call leaves the appended user message in
    /// place — the turn consumed budget even though it produced no reply.
    pub async fn completion_with(
        &mut self,
        prompt: &str,
        overrides: CompletionOverrides,
    ) -> Result<String> {
        let model = overrides
            .model
            .unwrap_or_else(|| self.config.default_model.clone());
        let temperature = overrides
            .temperature
            .unwrap_or(self.config.default_temperature);
        let max_tokens = overrides.max_tokens.or(self.config.default_max_tokens);

        self.transcript.push(Message::user(prompt));
        enforce_budget(
            &mut self.transcript,
            &self.counter,
            &model,
            self.config.token_budget,
        );

        log::debug!(
            "sending {} messages ({} tokens by per-message costing)",
            self.transcript.len(),
            self.counter.count_messages(self.transcript.messages(), &model)
        );

        let request = ChatRequest {
            model: model.clone(),
            messages: self.transcript.messages().to_vec(),
            temperature: Some(temperature),
            max_tokens,
        };
        let reply = self.client().chat_completion(&request).await?;

        self.transcript.push(Message::assistant(reply.clone()));
        enforce_budget(
            &mut self.transcript,
            &self.counter,
            &model,
            self.config.token_budget,
        );

        self.save().await?;
        Ok(reply)
    }

    /// Switch to a named persona. Fails on unknown names and on the
    /// reserved `Custom` sentinel (that one goes through
    /// [`Self::set_custom_system_message`]); the transcript is untouched on
    /// failure.
    pub async fn set_persona(&mut self, name: &str) -> Result<()> {
        let prompt = Self::lookup_persona(&self.personas, name)?.to_string();
        self.active_persona = Some(name.to_string());
        self.system_message = Some(prompt.clone());
        self.update_system_message_in_history(prompt).await
    }

    /// Install an ad-hoc system prompt under the `Custom` registry slot.
    pub async fn set_custom_system_message(&mut self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidInput(
                "custom system message must not be empty".to_string(),
            ));
        }
        self.personas.set_custom(trimmed);
        self.active_persona = Some(CUSTOM_PERSONA.to_string());
        self.system_message = Some(trimmed.to_string());
        self.update_system_message_in_history(trimmed.to_string()).await
    }

    /// Selectable persona names, in registry order.
    pub fn persona_names(&self) -> Vec<&'static str> {
        self.personas.names()
    }

    pub fn active_persona(&self) -> Option<&str> {
        self.active_persona.as_deref()
    }

    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_deref()
    }

    /// Full ordered transcript, for re-rendering by the caller layer.
    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Name of the backing resource (placeholder until the one-time
    /// descriptive rename has happened).
    pub fn history_name(&self) -> &str {
        &self.history_name
    }

    /// Precise per-message token cost of the current transcript under the
    /// default model. Introspection only — eviction uses a coarser rule.
    pub fn transcript_tokens(&self) -> usize {
        self.counter
            .count_messages(self.transcript.messages(), &self.config.default_model)
    }

    fn lookup_persona<'a>(personas: &'a PersonaRegistry, name: &str) -> Result<&'a str> {
        if PersonaRegistry::is_reserved(name) {
            return Err(SessionError::InvalidPersona(name.to_string()));
        }
        personas
            .get(name)
            .ok_or_else(|| SessionError::InvalidPersona(name.to_string()))
    }

    fn client(&mut self) -> &ChatClient {
        let config = &self.config;
        self.client.get_or_insert_with(|| {
            ChatClient::new(config.api_key.clone()).with_base_url(config.base_url.clone())
        })
    }

    async fn update_system_message_in_history(&mut self, prompt: String) -> Result<()> {
        self.transcript.upsert_system(prompt);
        self.save().await
    }

    async fn save(&mut self) -> Result<()> {
        self.store.save(&self.history_name, &self.transcript).await?;
        self.maybe_generate_descriptive_filename().await;
        Ok(())
    }

    /// Best-effort, one-time rename of the backing resource to a
    /// content-derived slug. The placeholder prefix acts as the one-shot
    /// guard: once renamed, the prefix no longer matches and this becomes a
    /// no-op. Every failure past the guard is swallowed and logged — naming
    /// must never abort a save.
    async fn maybe_generate_descriptive_filename(&mut self) {
        if !self.history_name.starts_with(PLACEHOLDER_PREFIX) {
            return;
        }

        let excerpt = self.excerpt_for_naming();
        if excerpt.is_empty() {
            // Nothing but the system message so far; keep the placeholder.
            return;
        }

        let raw = match self.request_slug(&excerpt).await {
            Ok(raw) => raw,
            Err(err) => {
                log::debug!("descriptive rename skipped, slug request failed: {err}");
                return;
            }
        };

        let slug = sanitize_slug(&raw);
        let new_name = self.store.unique_name(&slug).await;
        match self.store.rename(&self.history_name, &new_name).await {
            Ok(()) => {
                log::debug!("history renamed {} -> {new_name}", self.history_name);
                self.history_name = new_name;
            }
            Err(err) => log::debug!("descriptive rename failed: {err}"),
        }
    }

    /// `role: content` lines from the transcript, system message excluded,
    /// cut off once the excerpt budget is reached. Empty when no non-system
    /// content exists yet.
    fn excerpt_for_naming(&self) -> String {
        let model = &self.config.default_model;
        let mut excerpt = String::new();
        let mut used = 0;

        for message in self.transcript.messages() {
            if message.role == Role::System {
                continue;
            }
            let line = format!("{}: {}\n", message.role.as_str(), message.content);
            used += self.counter.count(&line, model);
            excerpt.push_str(&line);
            if used >= EXCERPT_TOKEN_BUDGET {
                break;
            }
        }

        excerpt.trim().to_string()
    }

    async fn request_slug(&mut self, excerpt: &str) -> llm_client::Result<String> {
        let request = ChatRequest {
            model: self.config.default_model.clone(),
            messages: vec![Message::user(format!(
                "Produce a short lowercase slug (a few words joined by underscores) \
                 naming the topic of this conversation. Reply with the slug only.\n\n{excerpt}"
            ))],
            temperature: Some(0.0),
            max_tokens: Some(SLUG_MAX_TOKENS),
        };
        self.client().chat_completion(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> SessionConfig {
        SessionConfig::new("test-key").with_history_dir(dir)
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_resource_exists() {
        let dir = tempdir().unwrap();
        let history_dir = dir.path().join("history");

        let err = ConversationManager::open(
            SessionConfig::new("  ").with_history_dir(&history_dir),
            SessionOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::Configuration(_)));
        assert!(!history_dir.exists());
    }

    #[tokio::test]
    async fn opens_with_persona_as_single_system_message() {
        let dir = tempdir().unwrap();
        let manager = ConversationManager::open(
            config(dir.path()),
            SessionOptions {
                persona: Some("Dave".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.messages()[0].role, Role::System);
        assert_eq!(manager.active_persona(), Some("Dave"));
        // Construction alone writes nothing.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn custom_system_message_wins_over_persona() {
        let dir = tempdir().unwrap();
        let manager = ConversationManager::open(
            config(dir.path()),
            SessionOptions {
                persona: Some("Dave".to_string()),
                system_message: Some("  be brief  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(manager.system_message(), Some("be brief"));
        assert_eq!(manager.active_persona(), Some(CUSTOM_PERSONA));
    }

    #[tokio::test]
    async fn unknown_persona_is_rejected_and_transcript_untouched() {
        let dir = tempdir().unwrap();
        let mut manager =
            ConversationManager::open(config(dir.path()), SessionOptions::default())
                .await
                .unwrap();

        let err = manager.set_persona("Nonexistent").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidPersona(_)));
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn reserved_custom_name_is_rejected() {
        let dir = tempdir().unwrap();
        let mut manager =
            ConversationManager::open(config(dir.path()), SessionOptions::default())
                .await
                .unwrap();

        let err = manager.set_persona(CUSTOM_PERSONA).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidPersona(_)));
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn blank_custom_message_is_invalid_input() {
        let dir = tempdir().unwrap();
        let mut manager =
            ConversationManager::open(config(dir.path()), SessionOptions::default())
                .await
                .unwrap();

        let err = manager.set_custom_system_message("   \n\t ").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn persona_switch_replaces_system_entry_and_persists() {
        let dir = tempdir().unwrap();
        let mut manager = ConversationManager::open(
            config(dir.path()),
            SessionOptions {
                persona: Some("Dave".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        manager.set_persona("Pirate").await.unwrap();

        let system_count = manager
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
        assert!(manager.messages()[0].content.contains("pirate"));

        let saved = dir.path().join(format!("{}.json", manager.history_name()));
        assert!(saved.exists());
    }

    #[tokio::test]
    async fn two_fresh_sessions_get_distinct_history_names() {
        let dir = tempdir().unwrap();
        let first = ConversationManager::open(config(dir.path()), SessionOptions::default())
            .await
            .unwrap();
        let mut second =
            ConversationManager::open(config(dir.path()), SessionOptions::default())
                .await
                .unwrap();

        // Force the first name onto disk so the second session must
        // disambiguate even within the same second.
        second.set_custom_system_message("probe").await.unwrap();
        let third = ConversationManager::open(config(dir.path()), SessionOptions::default())
            .await
            .unwrap();

        assert!(first.history_name().starts_with(PLACEHOLDER_PREFIX));
        assert_ne!(second.history_name(), third.history_name());
    }

    #[tokio::test]
    async fn resumes_existing_history_and_upserts_persona() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path());
        let existing = Transcript::from(vec![
            Message::user("earlier question"),
            Message::assistant("earlier answer"),
        ]);
        store.save("old_chat", &existing).await.unwrap();

        let manager = ConversationManager::open(
            config(dir.path()),
            SessionOptions {
                persona: Some("Sage".to_string()),
                history_name: Some("old_chat".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(manager.messages().len(), 3);
        assert_eq!(manager.messages()[0].role, Role::System);
        assert_eq!(manager.messages()[1].content, "earlier question");
    }

    #[tokio::test]
    async fn transcript_tokens_reports_precise_costing() {
        let dir = tempdir().unwrap();
        let manager = ConversationManager::open(
            config(dir.path()),
            SessionOptions {
                system_message: Some("be brief".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // One message: 3 list overhead + 3 message overhead + content.
        assert!(manager.transcript_tokens() > 6);
    }
}
