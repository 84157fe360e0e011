//! Connection settings for the model gateway.
//!
//! [`LlmConfig`] is a plain value: build it once (from the environment, a
//! config file or by hand) and hand it to the gateway builder and the
//! workflow factory. Nothing in the workspace reads these settings from a
//! global.

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ChunlianError, Result},
    model::{Model, OpenAiModel},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_BASE_URL: &str = "CHUNLIAN_API_BASE_URL";
pub const ENV_API_KEY: &str = "CHUNLIAN_API_KEY";
pub const ENV_MODEL: &str = "CHUNLIAN_MODEL";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Everything needed to reach an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL up to (and including) the version segment,
    /// e.g. `https://api.deepseek.com/v1`.
    pub base_url: String,
    /// Bearer token. Empty means "not configured".
    pub api_key: String,
    pub model: Model,
    /// Upper bound for completion tokens of a single stage call.
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Ask the backend for `response_format = json_schema`. Only enable this
    /// for providers that implement structured outputs.
    pub structured_output: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: String::new(),
            model: Model::OpenAi(OpenAiModel::Gpt4oMini),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            structured_output: false,
        }
    }
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: Model) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_key: api_key.into(),
            model,
            ..Self::default()
        }
    }

    /// Read `CHUNLIAN_API_BASE_URL`, `CHUNLIAN_API_KEY` (falling back to
    /// `OPENAI_API_KEY`) and `CHUNLIAN_MODEL`. Unset variables keep their
    /// defaults; a missing key only surfaces in [`Self::validate`].
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(api_key) = env::var(ENV_API_KEY)
            .ok()
            .or_else(|| env::var(ENV_OPENAI_API_KEY).ok())
        {
            config.api_key = api_key;
        }
        if let Ok(model) = env::var(ENV_MODEL) {
            config.model = Model::from_id(&model);
        }
        config.base_url = normalize_base_url(&config.base_url);
        config
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the settings are usable before any request is attempted.
    ///
    /// # Errors
    ///
    /// * [`ChunlianError::Invalid`] – if the API key or base URL is empty.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ChunlianError::Invalid(format!(
                "missing API key: set `{ENV_API_KEY}` or `{ENV_OPENAI_API_KEY}`"
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(ChunlianError::Invalid("base URL must not be empty".into()));
        }
        Ok(())
    }
}

/// Strip trailing slashes so `{base}/chat/completions` never doubles them.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}
