use std::{sync::Arc, time::Duration};

use chunlian_core::{
    config::LlmConfig,
    error::{ChunlianError, Result},
};

use crate::client::OpenAiClient;

/// Thin wrapper that wires the HTTP client [`OpenAiClient`] into a value that
/// implements [`chunlian_core::provider::ChatCompletionProvider`].
///
/// Besides chat completions it exposes the two maintenance calls of a
/// settings screen: [`Self::list_models`] and [`Self::test_connection`].
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    pub(crate) client: Arc<OpenAiClient>,
}

impl OpenAiAdapter {
    /// Model ids served by the configured endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.client.list_models().await?)
    }

    /// `true` if the endpoint answers an authenticated model listing.
    pub async fn test_connection(&self) -> bool {
        match self.client.list_models().await {
            Ok(models) => {
                tracing::info!(base_url = self.client.base_url(), models = models.len(), "connection ok");
                true
            }
            Err(err) => {
                tracing::warn!(base_url = self.client.base_url(), error = %err, "connection test failed");
                false
            }
        }
    }
}

/// Builder for [`OpenAiAdapter`].
///
/// # Typical usage
///
/// ```rust,no_run
/// use chunlian_openai::OpenAiAdapterBuilder;
///
/// let backend = OpenAiAdapterBuilder::new_from_env()
///     .build()
///     .expect("CHUNLIAN_API_KEY or OPENAI_API_KEY must be set");
/// ```
#[derive(Debug, Default)]
pub struct OpenAiAdapterBuilder {
    pub(crate) api_key: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) http: Option<reqwest::Client>,
}

impl OpenAiAdapterBuilder {
    /// Create an *empty* builder. Remember to supply an API key manually.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from [`LlmConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Never panics. Missing keys only surface during [`Self::build`].
    pub fn new_from_env() -> Self {
        Self::from_config(&LlmConfig::from_env())
    }

    /// Take endpoint, key and timeout from `config`.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            api_key: Some(config.api_key.clone()).filter(|key| !key.trim().is_empty()),
            base_url: Some(config.base_url.clone()),
            timeout: Some(config.timeout()),
            http: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured `reqwest::Client`. The timeout setting is ignored.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Finalise the builder and return a ready-to-use adapter.
    ///
    /// # Errors
    ///
    /// * [`ChunlianError::Invalid`] – if the API key is missing.
    /// * [`ChunlianError::Backend`] – if the HTTP client cannot be built.
    pub fn build(self) -> Result<OpenAiAdapter> {
        let api_key = self.api_key.ok_or(ChunlianError::Invalid(
            "missing API key: set `CHUNLIAN_API_KEY` or `OPENAI_API_KEY`".into(),
        ))?;

        let client = match self.http {
            Some(http) => OpenAiClient::with_http(api_key, http, self.base_url),
            None => OpenAiClient::new(api_key, self.base_url, self.timeout)?,
        };

        Ok(OpenAiAdapter {
            client: Arc::new(client),
        })
    }
}
