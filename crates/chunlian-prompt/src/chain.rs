//! Simple **builder** that concatenates multiple values implementing
//! [`IntoPrompt`](chunlian_core::template::IntoPrompt).
//!
//! A stage prompt is a short chain of fragments: the stage's system
//! instruction, optional context such as the current lunar year, and the
//! user prompt.
//!
//! ```rust
//! use chunlian_prompt::chain::PromptChain;
//! use chunlian_core::generic::GenericMessage;
//!
//! let messages: Vec<GenericMessage> = PromptChain::new()
//!     .with(GenericMessage::system("生成横批。输出JSON。"))
//!     .with(GenericMessage::user("为主题\"家庭\"生成横批。"))
//!     .build();
//!
//! assert_eq!(messages.len(), 2);
//! ```
use chunlian_core::template::IntoPrompt;

/// Lightweight container that accumulates messages produced by
/// [`IntoPrompt`] implementors.
pub struct PromptChain<Message>(Vec<Message>);

impl<Message> Default for PromptChain<Message> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Message> PromptChain<Message> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self(vec![])
    }

    /// Append the messages produced by `with` to the chain.
    pub fn with(mut self, with: impl IntoPrompt<Message = Message>) -> Self {
        self.0.append(&mut with.into_prompt());
        self
    }

    /// Append only when `with` is `Some`.
    pub fn with_optional(self, with: Option<impl IntoPrompt<Message = Message>>) -> Self {
        match with {
            Some(with) => self.with(with),
            None => self,
        }
    }

    /// Consume the builder and return the accumulated messages.
    pub fn build(self) -> Vec<Message> {
        self.0
    }
}
