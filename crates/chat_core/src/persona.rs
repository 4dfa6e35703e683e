use std::collections::HashMap;

/// Reserved registry slot for the most recently set ad-hoc prompt. Never a
/// selectable persona: choosing it goes through the custom-prompt path.
pub const CUSTOM_PERSONA: &str = "Custom";

/// Built-in personas, in the order they are offered to the shell.
const DEFAULT_PERSONAS: &[(&str, &str)] = &[
    (
        "Dave",
        "You are Dave, a laid-back, plain-spoken assistant. You explain things \
         with everyday analogies, keep answers short, and never use jargon \
         without unpacking it.",
    ),
    (
        "Sage",
        "You are a calm, precise mentor. You answer carefully, cite the \
         assumptions behind your reasoning, and point out what the user may \
         have overlooked.",
    ),
    (
        "Pirate",
        "You answer as a seasoned pirate captain. Heavy on nautical slang, \
         light on patience, but your facts are always shipshape.",
    ),
];

/// Mapping from persona name to system-prompt text.
///
/// Each registry instance owns its own copy of the defaults, so a custom
/// prompt stored in one session can never leak into another.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    prompts: HashMap<String, String>,
}

impl PersonaRegistry {
    pub fn new() -> Self {
        let prompts = DEFAULT_PERSONAS
            .iter()
            .map(|(name, prompt)| (name.to_string(), prompt.to_string()))
            .collect();
        Self { prompts }
    }

    pub fn is_reserved(name: &str) -> bool {
        name == CUSTOM_PERSONA
    }

    /// Prompt text for a persona, including the `Custom` slot if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// Store an ad-hoc prompt under the reserved `Custom` slot.
    pub fn set_custom(&mut self, prompt: impl Into<String>) {
        self.prompts.insert(CUSTOM_PERSONA.to_string(), prompt.into());
    }

    /// Selectable persona names in their built-in order. The reserved
    /// `Custom` slot is never offered.
    pub fn names(&self) -> Vec<&'static str> {
        DEFAULT_PERSONAS.iter().map(|(name, _)| *name).collect()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
