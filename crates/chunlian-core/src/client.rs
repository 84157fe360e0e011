//! Generic, lightweight client that executes a [`PromptTemplate`] against a
//! single concrete [`ChatCompletionProvider`].
//!
//! The client is **generic over the backend type `B`**, so the compiler
//! checks at build time that the backend speaks the workspace's provider
//! contract, without dynamic dispatch in user code.
//!
//! One call to [`CoupletClient::prompt_execute`] is exactly one stage
//! invocation: render the prompt, perform one gateway round-trip, and parse
//! the completion into `P::Output`. Nothing is retried here.
use std::sync::Arc;

use crate::{
    error::Result,
    generic::GenericMessage,
    json_extract::parse_json,
    model::Model,
    provider::{BoxFuture, ChatCompleteParameters, ChatCompletionProvider},
    schema_util::json_schema_response_format,
    template::{IntoPrompt, PromptTemplate},
};

/// A client bound to a single provider and a single model.
///
/// Clone the client if you need to share it across tasks; the backend lives
/// behind an `Arc`.
#[derive(Debug)]
pub struct CoupletClient<B> {
    backend: Arc<B>,
    model: Model,
    max_tokens: Option<u32>,
    structured_output: bool,
}

impl<B> Clone for CoupletClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            structured_output: self.structured_output,
        }
    }
}

impl<B> CoupletClient<B>
where
    B: ChatCompletionProvider,
{
    /// Create a new client that delegates all calls to `backend`.
    pub fn new(backend: B, model: Model) -> Self {
        Self {
            backend: Arc::new(backend),
            model,
            max_tokens: None,
            structured_output: false,
        }
    }

    /// Default completion token cap for stages that do not set their own.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Attach a `json_schema` response format derived from `P::Output`.
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    /// Access the underlying backend (e.g. to tweak provider-specific settings).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Render `prompt`, send it, and return the completion text untouched.
    pub async fn complete_text<P>(&self, prompt: P) -> Result<String>
    where
        P: PromptTemplate<Message = GenericMessage>,
    {
        let params = self.parameters::<P>(prompt.into_prompt());
        self.backend.chat_complete(params).await
    }

    /// Render `prompt`, send it, and parse the completion into `P::Output`.
    pub async fn prompt_execute<P>(&self, prompt: P) -> Result<P::Output>
    where
        P: PromptTemplate<Message = GenericMessage>,
    {
        let mut params = self.parameters::<P>(prompt.into_prompt());
        if self.structured_output {
            params = params.with_response_format(json_schema_response_format::<P::Output>(
                short_type_name::<P::Output>(),
            ));
        }

        let raw = self.backend.chat_complete(params).await?;
        Ok(parse_json::<P::Output>(&raw)?)
    }

    fn parameters<P: PromptTemplate>(&self, messages: Vec<GenericMessage>) -> ChatCompleteParameters {
        let params =
            ChatCompleteParameters::new(messages, self.model.clone()).with_temperature(P::TEMPERATURE);
        match P::MAX_TOKENS.or(self.max_tokens) {
            Some(max_tokens) => params.with_max_tokens(max_tokens),
            None => params,
        }
    }
}

impl<B: ChatCompletionProvider> ChatCompletionProvider for CoupletClient<B> {
    fn chat_complete<'p>(&'p self, params: ChatCompleteParameters) -> BoxFuture<'p, Result<String>> {
        self.backend.chat_complete(params)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use schemars::JsonSchema;
    use serde::Deserialize;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ChatCompleteParameters>>,
        reply: String,
    }

    impl ChatCompletionProvider for Recorder {
        fn chat_complete<'p>(
            &'p self,
            params: ChatCompleteParameters,
        ) -> BoxFuture<'p, Result<String>> {
            self.seen.lock().unwrap().push(params);
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    struct Upper {
        upper_couplet: String,
    }

    struct UpperPrompt;

    impl IntoPrompt for UpperPrompt {
        type Message = GenericMessage;

        fn into_prompt(self) -> Vec<Self::Message> {
            vec![
                GenericMessage::system("生成春联上联。输出JSON。"),
                GenericMessage::user("为主题\"事业\"生成七言上联。"),
            ]
        }
    }

    impl PromptTemplate for UpperPrompt {
        type Output = Upper;
        const TEMPERATURE: f64 = 0.8;
        const MAX_TOKENS: Option<u32> = Some(500);
    }

    #[tokio::test]
    async fn prompt_execute_sends_stage_settings_and_parses() {
        let backend = Arc::new(Recorder {
            reply: "```json\n{\"upperCouplet\":\"鹏程万里展宏图\"}\n```".into(),
            ..Default::default()
        });
        let client = CoupletClient::new(Arc::clone(&backend), Model::from_id("gpt-4o-mini"))
            .with_max_tokens(800)
            .with_structured_output(true);

        let upper = client.prompt_execute(UpperPrompt).await.unwrap();
        assert_eq!(upper.upper_couplet, "鹏程万里展宏图");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let params = &seen[0];
        assert_eq!(params.temperature, Some(0.8));
        assert_eq!(params.max_tokens, Some(500));
        assert_eq!(params.system_prompt(), Some("生成春联上联。输出JSON。"));
        let format = params.response_format.as_ref().unwrap();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "Upper");
    }

    #[tokio::test]
    async fn unparsable_completion_is_a_parse_error() {
        let backend = Recorder {
            reply: "我不知道".into(),
            ..Default::default()
        };
        let client = CoupletClient::new(backend, Model::from_id("gpt-4o-mini"));
        let err = client.prompt_execute(UpperPrompt).await.unwrap_err();
        assert!(matches!(err, crate::error::ChunlianError::Parse(_)));
    }
}
