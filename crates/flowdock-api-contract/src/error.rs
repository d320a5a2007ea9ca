//! Error types for option validation, query encoding and content decoding

use thiserror::Error;

/// Errors raised while turning request options into a request
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Missing required options: {0}")]
    MissingOptions(&'static str),

    #[error("Unsupported options: {0}")]
    UnsupportedOptions(String),
}

/// A message payload did not match the shape its event type requires
#[derive(Debug, Error)]
#[error("failed to decode content of {event:?} message: {source}")]
pub struct ContentError {
    pub event: String,
    #[source]
    pub source: serde_json::Error,
}
