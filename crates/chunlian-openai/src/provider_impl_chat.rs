use std::sync::Arc;

use chunlian_core::{
    error::Result,
    generic::GenericUsageReport,
    provider::{BoxFuture, ChatCompleteParameters, ChatCompletionProvider},
};

use crate::{
    OpenAiAdapter,
    api_v1::{ChatCompletionRequest, FinishReason},
    error::OpenAiError,
};

impl ChatCompletionProvider for OpenAiAdapter {
    fn chat_complete<'p>(&'p self, params: ChatCompleteParameters) -> BoxFuture<'p, Result<String>> {
        let client = Arc::clone(&self.client);

        Box::pin(async move {
            let request = ChatCompletionRequest::try_from(params)?;
            let response = client.chat_completion(request).await?;

            if let Some(usage) = response.usage {
                let report = GenericUsageReport {
                    prompt_tokens: usage.prompt_tokens as i64,
                    completion_tokens: usage.completion_tokens as i64,
                    total_tokens: usage.total_tokens as i64,
                };
                tracing::debug!(
                    prompt_tokens = report.prompt_tokens,
                    completion_tokens = report.completion_tokens,
                    total_tokens = report.total_tokens,
                    "chat completion usage"
                );
            }

            let Some(content) = response.first_content() else {
                let reason = response
                    .choices
                    .first()
                    .and_then(|choice| choice.finish_reason.as_ref());
                return Err(match reason {
                    None if response.choices.is_empty() => {
                        OpenAiError::Format("response has no choices".into())
                    }
                    Some(FinishReason::ContentFilter) => {
                        OpenAiError::Format("completion was blocked by the content filter".into())
                    }
                    other => OpenAiError::Format(format!(
                        "first choice has no content (finish reason: {other:?})"
                    )),
                }
                .into());
            };

            Ok(content.to_owned())
        })
    }
}
