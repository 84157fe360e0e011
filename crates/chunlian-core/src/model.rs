//! Model identifiers used throughout the **chunlian** workspace.
//!
//! Well-known OpenAI models get an enum variant so application code does not
//! have to type literal strings such as `"gpt-4o-mini"`. Everything else an
//! OpenAI-compatible gateway may serve (DeepSeek, Qwen, a self-hosted vLLM…)
//! travels as [`Model::Custom`].
//!
//! # Example
//!
//! ```rust
//! use chunlian_core::model::{Model, OpenAiModel};
//! assert_eq!(Model::from_id("gpt-4o-mini"), Model::OpenAi(OpenAiModel::Gpt4oMini));
//! assert_eq!(Model::from_id("deepseek-chat"), Model::Custom("deepseek-chat".into()));
//! ```

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Universal identifier for an LLM model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Model {
    /// Built-in OpenAI models (chat completion API).
    OpenAi(OpenAiModel),
    /// Any model id served by an OpenAI-compatible endpoint.
    Custom(String),
}

/// Models with a dedicated variant. The list is kept short; anything else
/// goes through [`Model::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenAiModel {
    Gpt4o,
    Gpt4oMini,
    Gpt4_1,
    Gpt4_1Mini,
}

impl OpenAiModel {
    pub const ALL: [OpenAiModel; 4] = [
        OpenAiModel::Gpt4o,
        OpenAiModel::Gpt4oMini,
        OpenAiModel::Gpt4_1,
        OpenAiModel::Gpt4_1Mini,
    ];

    /// Wire name as expected by the `model` field of a chat request.
    pub fn id(&self) -> &'static str {
        match self {
            OpenAiModel::Gpt4o => "gpt-4o",
            OpenAiModel::Gpt4oMini => "gpt-4o-mini",
            OpenAiModel::Gpt4_1 => "gpt-4.1",
            OpenAiModel::Gpt4_1Mini => "gpt-4.1-mini",
        }
    }
}

impl Model {
    /// Resolve a user supplied model id.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        OpenAiModel::ALL
            .into_iter()
            .find(|m| m.id() == id)
            .map(Model::OpenAi)
            .unwrap_or_else(|| Model::Custom(id.to_owned()))
    }
}

impl From<OpenAiModel> for Model {
    fn from(val: OpenAiModel) -> Self {
        Model::OpenAi(val)
    }
}

impl From<String> for Model {
    fn from(value: String) -> Self {
        Model::from_id(&value)
    }
}

impl From<Model> for String {
    fn from(value: Model) -> Self {
        value.to_string()
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::OpenAi(model) => f.write_str(model.id()),
            Model::Custom(id) => f.write_str(id),
        }
    }
}
