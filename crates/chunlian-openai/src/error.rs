use chunlian_core::error::ChunlianError;
use reqwest::StatusCode;

/// High-level error type covering every failure mode the client can hit.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("couldn’t serialise body: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("gateway returned non-success status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("gateway format error: {0}")]
    Format(String),
}

impl From<OpenAiError> for ChunlianError {
    fn from(value: OpenAiError) -> Self {
        ChunlianError::Backend(Box::new(value))
    }
}
