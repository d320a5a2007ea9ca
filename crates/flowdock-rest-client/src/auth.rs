//! Authentication methods for the REST API client

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::{RestClientError, RestClientResult};
use crate::oauth::CredentialStore;

/// Authentication methods supported by the API
#[derive(Debug, Clone, Default)]
pub enum AuthMethod {
    /// OAuth2 access token (`Authorization: Bearer <token>`)
    Bearer(String),
    /// Personal API token, sent as the basic-auth user with an empty password
    PersonalToken(String),
    /// No authentication
    #[default]
    None,
}

impl AuthMethod {
    /// Apply authentication headers to a request
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> RestClientResult<()> {
        let value = match self {
            AuthMethod::Bearer(token) => format!("Bearer {}", token),
            AuthMethod::PersonalToken(token) => {
                format!("Basic {}", STANDARD.encode(format!("{}:", token)))
            }
            AuthMethod::None => return Ok(()),
        };

        let mut value =
            HeaderValue::from_str(&value).map_err(|e| RestClientError::Auth(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    pub fn personal_token(token: impl Into<String>) -> Self {
        Self::PersonalToken(token.into())
    }
}

/// Authentication configuration for the client
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub method: AuthMethod,
}

impl AuthConfig {
    /// Create a new auth config with OAuth2 bearer authentication
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::bearer(token),
        }
    }

    /// Create a new auth config with personal token authentication
    pub fn with_personal_token(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::personal_token(token),
        }
    }

    /// Bearer authentication from the token held by `store`, if any.
    pub fn from_store(store: &dyn CredentialStore) -> RestClientResult<Option<Self>> {
        Ok(store
            .load()?
            .map(|token| Self::with_bearer(token.access_token)))
    }

    /// Get headers for this authentication configuration
    pub fn headers(&self) -> RestClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        self.method.apply_to_headers(&mut headers)?;
        Ok(headers)
    }
}
