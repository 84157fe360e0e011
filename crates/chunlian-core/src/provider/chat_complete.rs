use std::{future::Future, pin::Pin, sync::Arc};

use crate::{error::Result, generic::GenericMessage, model::Model};

/// Boxed future returned by the provider traits of this workspace.
///
/// Spelled out once so trait objects stay usable without pulling in
/// `async_trait`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The **model gateway**: turns a chat prompt into a network call to a
/// concrete provider and returns the raw text of the first completion choice.
///
/// * No retries at this layer. Retry budgets belong to the workflow.
/// * No parsing. Extracting JSON from the text is the job of
///   [`crate::json_extract`].
pub trait ChatCompletionProvider: Send + Sync {
    /// Execute a single non-streaming round-trip.
    fn chat_complete<'p>(&'p self, params: ChatCompleteParameters) -> BoxFuture<'p, Result<String>>;
}

impl<P> ChatCompletionProvider for Arc<P>
where
    P: ChatCompletionProvider + ?Sized,
{
    fn chat_complete<'p>(&'p self, params: ChatCompleteParameters) -> BoxFuture<'p, Result<String>> {
        (**self).chat_complete(params)
    }
}

#[derive(Debug, Clone)]
pub struct ChatCompleteParameters {
    pub messages: Vec<GenericMessage>,
    pub model: Model,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub response_format: Option<serde_json::Value>,
}

impl ChatCompleteParameters {
    pub fn new(messages: Vec<GenericMessage>, model: Model) -> Self {
        Self {
            messages,
            model,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn messages(&self) -> &[GenericMessage] {
        &self.messages
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Content of the first system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == crate::generic::GenericRole::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::generic::GenericRole::User)
            .map(|m| m.content.as_str())
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_response_format(mut self, response_format: serde_json::Value) -> Self {
        self.response_format = Some(response_format);
        self
    }
}
