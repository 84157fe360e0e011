//! A minimal fragment that injects a borrowed string into the prompt under a
//! given chat role.
//!
//! ```rust
//! use chunlian_types::fragments::StaticFragment;
//! use chunlian_core::generic::GenericRole;
//!
//! let sys_msg = StaticFragment::new("生成横批。输出JSON。", GenericRole::System);
//! ```
//!
//! The `From<&str>` impl defaults to `GenericRole::System` since system
//! instructions are the most common static fragments.

use chunlian_core::{
    generic::{GenericMessage, GenericRole},
    template::IntoPrompt,
};

/// A borrowed string bundled with an LLM chat role.
pub struct StaticFragment<'a>((&'a str, GenericRole));

impl<'a> From<&'a str> for StaticFragment<'a> {
    fn from(value: &'a str) -> Self {
        Self((value, GenericRole::System))
    }
}

impl<'a> StaticFragment<'a> {
    /// Create a new fragment with explicit role.
    pub fn new(value: &'a str, role: GenericRole) -> Self {
        Self((value, role))
    }
}

impl IntoPrompt for StaticFragment<'_> {
    type Message = GenericMessage;

    fn into_prompt(self) -> Vec<Self::Message> {
        vec![GenericMessage::new(self.0.0.to_string(), self.0.1)]
    }
}
