//! Unified error type exposed by **`chunlian-core`**.
//!
//! Provider crates convert their internal errors into one of these variants
//! before bubbling them up to the [`CoupletClient`](crate::client::CoupletClient).
//! The workflow layer treats every variant the same way: one failed attempt
//! of the current stage.

use thiserror::Error;

use crate::json_extract::ParseError;

/// Convenient alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ChunlianError>;

#[derive(Debug, Error)]
pub enum ChunlianError {
    /// Failure while serialising or deserialising JSON payloads sent to / received
    /// from the LLM provider.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The completion could not be turned into the JSON object a stage expects.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Generic forwarding of any backend-specific error (transport failure,
    /// non-2xx status, response without content).
    #[error("backend returned an error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid: {0}")]
    Invalid(String),
}
