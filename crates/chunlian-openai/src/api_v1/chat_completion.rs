use chunlian_core::error::ChunlianError;
use chunlian_core::generic::{GenericMessage, GenericRole};
use chunlian_core::provider::ChatCompleteParameters;
use serde::{Deserialize, Serialize};

use crate::impl_builder_methods;
use crate::model_map::map_model;

use super::common;

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: String, messages: Vec<ChatCompletionMessage>) -> Self {
        Self {
            model,
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }
}

impl_builder_methods!(
    ChatCompletionRequest,
    temperature: f64,
    max_tokens: u32,
    response_format: serde_json::Value
);

impl TryFrom<ChatCompleteParameters> for ChatCompletionRequest {
    type Error = ChunlianError;

    fn try_from(value: ChatCompleteParameters) -> Result<Self, Self::Error> {
        Ok(Self {
            model: map_model(&value.model)
                .ok_or(ChunlianError::InvalidRequest(format!(
                    "backend does not support selected model: {:?}",
                    value.model
                )))?
                .into(),
            messages: value.messages.into_iter().map(Into::into).collect(),
            temperature: value.temperature,
            max_tokens: value.max_tokens,
            response_format: value.response_format,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    System,
    Assistant,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatCompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionMessageForResponse {
    #[serde(default)]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: Option<String>,
    /// Reasoning models served through compatible gateways put their chain
    /// of thought here. It is never used as the answer.
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(default)]
    pub index: i64,
    pub message: ChatCompletionMessageForResponse,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<common::Usage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    #[serde(other)]
    Other,
}

impl From<GenericRole> for MessageRole {
    fn from(value: GenericRole) -> Self {
        match value {
            GenericRole::System => MessageRole::System,
            GenericRole::Assistant => MessageRole::Assistant,
            GenericRole::User => MessageRole::User,
        }
    }
}

impl From<MessageRole> for GenericRole {
    fn from(value: MessageRole) -> Self {
        match value {
            MessageRole::User => GenericRole::User,
            MessageRole::System => GenericRole::System,
            MessageRole::Assistant => GenericRole::Assistant,
        }
    }
}

impl From<GenericMessage> for ChatCompletionMessage {
    fn from(value: GenericMessage) -> Self {
        Self {
            role: value.role.into(),
            content: value.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use chunlian_core::model::Model;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_shape() {
        let params = ChatCompleteParameters::new(
            vec![
                GenericMessage::system("生成横批。输出JSON。"),
                GenericMessage::user("为主题\"家庭\"生成横批。"),
            ],
            Model::from_id("deepseek-chat"),
        )
        .with_temperature(0.8)
        .with_max_tokens(800);

        let request = ChatCompletionRequest::try_from(params).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "生成横批。输出JSON。"},
                    {"role": "user", "content": "为主题\"家庭\"生成横批。"}
                ],
                "temperature": 0.8,
                "max_tokens": 800
            })
        );
    }

    #[test]
    fn blank_model_is_rejected() {
        let params = ChatCompleteParameters::new(vec![], Model::Custom(String::new()));
        let err = ChatCompletionRequest::try_from(params).unwrap_err();
        assert!(matches!(err, ChunlianError::InvalidRequest(_)));
    }

    #[test]
    fn content_of_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"horizontalScroll\":\"万象更新\"}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 9, "total_tokens": 21}
        }))
        .unwrap();
        assert_eq!(response.first_content(), Some("{\"horizontalScroll\":\"万象更新\"}"));
        assert_eq!(response.usage.unwrap().total_tokens, 21);
    }

    #[test]
    fn missing_or_blank_content_yields_none() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(empty.first_content(), None);

        let blank: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  "}, "finish_reason": "length"}]
        }))
        .unwrap();
        assert_eq!(blank.first_content(), None);

        let unknown: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null}, "finish_reason": "insufficient_system_resource"}]
        }))
        .unwrap();
        assert_eq!(unknown.choices[0].finish_reason, Some(FinishReason::Other));
    }
}
