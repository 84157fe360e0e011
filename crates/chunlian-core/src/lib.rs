//! Provider-agnostic building blocks for the chunlian couplet workflow.
//!
//! | Module            | What it provides                                              |
//! |-------------------|---------------------------------------------------------------|
//! | [`provider`]      | The model gateway contract ([`ChatCompletionProvider`])       |
//! | [`client`]        | [`CoupletClient`]: prompt → gateway → parsed output           |
//! | [`template`]      | [`PromptTemplate`] / [`IntoPrompt`]                           |
//! | [`json_extract`]  | Layered JSON extraction from free-form completions            |
//! | [`validate`]      | Character-count constraints                                   |
//! | [`config`]        | [`LlmConfig`](config::LlmConfig) connection settings          |
//!
//! [`ChatCompletionProvider`]: provider::ChatCompletionProvider
//! [`CoupletClient`]: client::CoupletClient
//! [`PromptTemplate`]: template::PromptTemplate
//! [`IntoPrompt`]: template::IntoPrompt
pub mod client;
pub mod config;
pub mod error;
pub mod generic;
pub mod json_extract;
pub mod model;
pub mod provider;
pub mod schema_util;
pub mod template;
pub mod validate;

pub use client::CoupletClient;
