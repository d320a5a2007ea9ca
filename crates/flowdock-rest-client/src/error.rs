//! Error types for the REST API client

use std::borrow::Cow;

use flowdock_api_contract::{ApiContractError, ContentError};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

/// Errors that can occur when using the REST API client
#[derive(Debug, Error)]
pub enum RestClientError {
    /// The HTTP round trip could not complete
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status outside 2xx
    #[error("{method} {url}: {status} {}", String::from_utf8_lossy(.body))]
    Api {
        method: Method,
        url: Url,
        status: StatusCode,
        /// Raw response body; empty if it could not be read
        body: Vec<u8>,
    },

    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A message payload did not match its event; lets callers apply `?` to
    /// [`Message::content`](flowdock_api_contract::Message::content)
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Options were missing or invalid; raised before any request is sent
    #[error("Invalid request options: {0}")]
    Config(#[from] ApiContractError),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("SSE stream error: {0}")]
    Sse(String),

    #[error("Token cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestClientError {
    /// Status code of an API status error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RestClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of an API status error, lossily decoded as UTF-8.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RestClientError::Api { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }
}

/// Out-of-band failures reported by a stream subscription.
///
/// Only [`Rejected`](StreamError::Rejected) ends the subscription.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An event arrived whose payload is not a message
    #[error("failed to decode stream event {event_id:?}: {source}")]
    Decode {
        event_id: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    /// The connection failed; the subscription reconnects with backoff
    #[error("stream transport error: {0}")]
    Transport(String),

    /// The stream host refused the credentials (401 or 403)
    #[error("stream rejected with status {status}")]
    Rejected { status: u16 },
}

/// Result type alias for REST client operations
pub type RestClientResult<T> = Result<T, RestClientError>;
