//! OpenAI-compatible model gateway.
//!
//! Any endpoint that speaks `POST {base_url}/chat/completions` works:
//! OpenAI itself, DeepSeek, Qwen's compatible mode, a local vLLM. Build an
//! [`OpenAiAdapter`] from an [`LlmConfig`](chunlian_core::config::LlmConfig)
//! and hand it to a [`CoupletClient`](chunlian_core::CoupletClient).
mod adapter;
mod model_map;
mod provider_impl_chat;

pub use adapter::{OpenAiAdapter, OpenAiAdapterBuilder};
pub use client::OpenAiClient;
pub mod api_v1;
mod client;
pub mod error;
