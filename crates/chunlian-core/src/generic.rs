//! Generic message and role types used by the *chunlian-core* crate.
//!
//! The workflow only ever sends a system instruction followed by a single
//! user prompt, so the message type stays deliberately small. Provider crates
//! convert it into their wire structs via `From`/`Into`.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lightweight container representing a single chat message that is
/// independent of any specific LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericMessage {
    pub content: String,
    pub role: GenericRole,
}

impl GenericMessage {
    /// Convenience constructor mirroring the field order used by common HTTP
    /// APIs (`role`, then `content`).
    ///
    /// ```rust
    /// use chunlian_core::generic::{GenericMessage, GenericRole};
    ///
    /// let sys = GenericMessage::new("生成春联上联。输出JSON。".into(),
    ///                               GenericRole::System);
    /// ```
    pub fn new(message: String, role: GenericRole) -> Self {
        Self {
            content: message,
            role,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(message.into(), GenericRole::System)
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(message.into(), GenericRole::User)
    }
}

/// Chat roles understood by OpenAI-compatible backends.
///
/// The `Display` implementation renders the canonical lowercase name so you
/// can feed it directly into JSON without extra mapping logic.
#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenericRole {
    /// “System” messages define global behaviour and style guidelines.
    System,
    /// Messages produced by the assistant / model.
    Assistant,
    /// Messages originating from the human user.
    User,
}

impl Display for GenericRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericRole::System => write!(f, "system"),
            GenericRole::Assistant => write!(f, "assistant"),
            GenericRole::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericUsageReport {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}
