//! Abstractions that tie a **prompt** to sampling settings and a **typed
//! response**.
//!
//! Two traits take a stage from "some string fragments" to "ready-to-send
//! payload":
//!
//! 1. [`IntoPrompt`] – turns *any* value into a list of chat messages.
//! 2. [`PromptTemplate`] – adds the sampling temperature and the JSON shape
//!    the completion must deserialize into.
//!
//! ```rust
//! use chunlian_core::template::{IntoPrompt, PromptTemplate};
//! use chunlian_core::generic::GenericMessage;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! #[serde(rename_all = "camelCase")]
//! struct Scroll { horizontal_scroll: String }
//!
//! struct ScrollPrompt;
//!
//! impl IntoPrompt for ScrollPrompt {
//!     type Message = GenericMessage;
//!     fn into_prompt(self) -> Vec<Self::Message> {
//!         vec![
//!             GenericMessage::system("生成横批。输出JSON。"),
//!             GenericMessage::user("为主题\"事业\"生成横批。"),
//!         ]
//!     }
//! }
//!
//! impl PromptTemplate for ScrollPrompt {
//!     type Output = Scroll;
//!     const TEMPERATURE: f64 = 0.8;
//! }
//! ```
use std::any::Any;

use schemars::JsonSchema;
use serde::Deserialize;

/// High-level description of a prompt.
///
/// Implement this trait **in addition** to [`IntoPrompt`] to specify:
///
/// * `Output` – the strongly-typed Rust struct you expect from the LLM.
/// * `TEMPERATURE` – sampling temperature for this stage.
/// * `MAX_TOKENS` – optional per-stage cap; `None` defers to the gateway
///   configuration.
pub trait PromptTemplate: IntoPrompt {
    /// Type produced by the LLM and returned to the caller.
    type Output: JsonSchema + for<'de> Deserialize<'de> + Any;

    const TEMPERATURE: f64;

    const MAX_TOKENS: Option<u32> = None;
}

/// Converts a value into a series of chat messages.
pub trait IntoPrompt {
    /// Chat message representation emitted by the prompt.
    type Message: Send + Sync + 'static;

    /// Consume `self` and return **all** messages in the desired order.
    fn into_prompt(self) -> Vec<Self::Message>;
}

/// Convenience implementation so a single [`crate::generic::GenericMessage`]
/// can be chained directly without wrapping it in a struct.
impl IntoPrompt for crate::generic::GenericMessage {
    type Message = crate::generic::GenericMessage;

    fn into_prompt(self) -> Vec<Self::Message> {
        vec![self]
    }
}
