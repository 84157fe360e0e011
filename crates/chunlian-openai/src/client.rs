use reqwest::{
    Client as HttpClient,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::time::Duration;

use chunlian_core::config::{DEFAULT_BASE_URL, normalize_base_url};

use crate::{
    api_v1::{ChatCompletionRequest, ChatCompletionResponse, ModelList},
    error::OpenAiError,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimal HTTP client for an OpenAI-compatible API.
///
/// * Non-streaming only (one request ▶ one response).
/// * Accepts and returns the `api_v1` request / response structs defined
///   in this crate.
/// * Shares a single `reqwest::Client`, so cloning `OpenAiClient` is cheap.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    http: HttpClient,
    base: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client with its own `reqwest` connection pool and the given
    /// request timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, OpenAiError> {
        let http = HttpClient::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(Self::with_http(api_key, http, base_url))
    }

    /// Build with a custom `reqwest::Client` in case the caller needs proxy
    /// settings, custom TLS, etc.
    pub fn with_http(
        api_key: impl Into<String>,
        http: HttpClient,
        base_url: Option<String>,
    ) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            api_key: api_key.into(),
            http,
            base: normalize_base_url(&base),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn headers(&self) -> Result<HeaderMap, OpenAiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| OpenAiError::Format("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Perform a **non-streaming** chat completion.
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        let url = format!("{}/chat/completions", self.base);
        tracing::debug!(
            %url,
            model = %request.model,
            temperature = ?request.temperature,
            max_tokens = ?request.max_tokens,
            "sending chat completion"
        );

        let resp = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "chat completion rejected");
            return Err(OpenAiError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed)
    }

    /// `GET {base}/models`: ids of the models the endpoint serves.
    pub async fn list_models(&self) -> Result<Vec<String>, OpenAiError> {
        let url = format!("{}/models", self.base);
        tracing::debug!(%url, "listing models");

        let resp = self.http.get(url).headers(self.headers()?).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OpenAiError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: ModelList = serde_json::from_slice(&bytes)?;
        Ok(parsed.ids())
    }
}
