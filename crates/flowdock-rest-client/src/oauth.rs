//! OAuth2 authorization-code flow and token persistence

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::client::check_status;
use crate::error::{RestClientError, RestClientResult};

pub const DEFAULT_AUTH_URL: &str = "https://api.flowdock.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.flowdock.com/oauth/token";
pub const DEFAULT_REDIRECT_URL: &str = "urn:ietf:wg:oauth:2.0:oob";
pub const DEFAULT_SCOPE: &str = "flow private manage profile offline_access";

/// An OAuth2 access token as persisted in a credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            refresh_token: None,
            expiry: None,
        }
    }

    /// A token without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= Utc::now())
    }
}

/// Somewhere to keep a token between runs
pub trait CredentialStore: Send + Sync {
    /// The stored token, or `None` when nothing has been stored yet.
    fn load(&self) -> RestClientResult<Option<Token>>;
    fn save(&self, token: &Token) -> RestClientResult<()>;
}

/// Token store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileTokenCache {
    fn load(&self) -> RestClientResult<Option<Token>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let token = serde_json::from_slice(&data).map_err(RestClientError::Decode)?;
        Ok(Some(token))
    }

    fn save(&self, token: &Token) -> RestClientResult<()> {
        let data = serde_json::to_vec_pretty(token).map_err(RestClientError::Encode)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "token cached");
        Ok(())
    }
}

/// Client registration and endpoints for the authorization-code flow
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scope: String,
    pub auth_url: Url,
    pub token_url: Url,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl OAuthConfig {
    /// Configuration against the public Flowdock OAuth endpoints
    pub fn flowdock(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> RestClientResult<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: Url::parse(DEFAULT_AUTH_URL)?,
            token_url: Url::parse(DEFAULT_TOKEN_URL)?,
        })
    }

    /// URL the user visits to grant access and obtain a code
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        url
    }

    /// Trade an authorization code for a token and save it to `store`.
    pub async fn exchange(
        &self,
        code: &str,
        store: &dyn CredentialStore,
    ) -> RestClientResult<Token> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let token = self.request_token(&form).await?;
        store.save(&token)?;
        info!("obtained access token");
        Ok(token)
    }

    /// Renew `token` with its refresh token and save the result to `store`.
    ///
    /// The old refresh token is kept when the server does not issue a new one.
    pub async fn refresh(
        &self,
        token: &Token,
        store: &dyn CredentialStore,
    ) -> RestClientResult<Token> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| RestClientError::Auth("token has no refresh token".into()))?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let mut renewed = self.request_token(&form).await?;
        if renewed.refresh_token.is_none() {
            renewed.refresh_token = token.refresh_token.clone();
        }
        store.save(&renewed)?;
        info!("refreshed access token");
        Ok(renewed)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> RestClientResult<Token> {
        let response = reqwest::Client::new()
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;
        let response = check_status(reqwest::Method::POST, self.token_url.clone(), response).await?;

        let bytes = response.bytes().await?;
        let body: TokenResponse = serde_json::from_slice(&bytes).map_err(RestClientError::Decode)?;

        Ok(Token {
            access_token: body.access_token,
            token_type: body.token_type,
            refresh_token: body.refresh_token,
            expiry: body
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
