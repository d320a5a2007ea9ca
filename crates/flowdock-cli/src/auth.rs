//! Obtaining credentials for the command-line tools
//!
//! A cached OAuth token is used when present; an expired one is refreshed when
//! it carries a refresh token and `--id` and `--secret` are given. Otherwise
//! the user is walked
//! through the authorization-code flow: run once with `--id` and `--secret` to
//! get an authorization URL, then again with `--code` to exchange the code and
//! cache the resulting token.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use flowdock_rest_client::oauth::{
    DEFAULT_AUTH_URL, DEFAULT_REDIRECT_URL, DEFAULT_SCOPE, DEFAULT_TOKEN_URL,
};
use flowdock_rest_client::{AuthConfig, CredentialStore, FileTokenCache, OAuthConfig, Token};
use tracing::{debug, warn};
use url::Url;

pub const USAGE: &str = "
To obtain a request token you must specify both --id and --secret.

To obtain a Client ID and Secret, see the \"OAuth 2 Credentials\" section under
the \"API Access\" tab on this page: https://flowdock.com/account/authorized_applications

Once you have completed the OAuth flow, the credentials are stored inside the
file specified by --cache and you may run without the --id and --secret flags.
";

/// OAuth and token options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// OAuth client id
    #[arg(long, global = true)]
    pub id: Option<String>,

    /// OAuth client secret
    #[arg(long, global = true)]
    pub secret: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_REDIRECT_URL)]
    pub redirect_url: String,

    /// Authorization endpoint
    #[arg(long, global = true, default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,

    /// Token endpoint
    #[arg(long, global = true, default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    /// Authorization code obtained from the authorization URL
    #[arg(long, global = true)]
    pub code: Option<String>,

    /// Token cache file
    #[arg(long, global = true, default_value = "cache.json")]
    pub cache: PathBuf,

    #[arg(long, global = true, default_value = DEFAULT_SCOPE)]
    pub scope: String,

    /// Personal API token; skips the OAuth flow entirely
    #[arg(long, global = true, conflicts_with_all = ["id", "secret", "code"])]
    pub personal_token: Option<String>,
}

/// Credentials ready for use
#[derive(Debug, Clone)]
pub struct Session {
    pub auth: AuthConfig,
    /// Token passed to the streaming host
    pub token: String,
}

impl Session {
    fn from_token(token: Token) -> Self {
        Self {
            auth: AuthConfig::with_bearer(token.access_token.clone()),
            token: token.access_token,
        }
    }
}

/// Result of trying to authenticate from the command line
#[derive(Debug)]
pub enum Authentication {
    Authorized(Session),
    /// No cached token and no client credentials to start the flow with
    MissingCredentials,
    /// The user must visit this URL and rerun with `--code`
    AuthorizationRequired(Url),
}

impl AuthArgs {
    pub fn oauth_config(&self, id: &str, secret: &str) -> Result<OAuthConfig> {
        Ok(OAuthConfig {
            client_id: id.to_string(),
            client_secret: secret.to_string(),
            redirect_url: self.redirect_url.clone(),
            scope: self.scope.clone(),
            auth_url: Url::parse(&self.auth_url).context("invalid --auth-url")?,
            token_url: Url::parse(&self.token_url).context("invalid --token-url")?,
        })
    }

    pub async fn authenticate(&self) -> Result<Authentication> {
        if let Some(token) = &self.personal_token {
            return Ok(Authentication::Authorized(Session {
                auth: AuthConfig::with_personal_token(token.clone()),
                token: token.clone(),
            }));
        }

        let cache = FileTokenCache::new(self.cache.clone());
        let cached = cache.load().context("reading token cache")?;
        if let Some(token) = &cached {
            if !token.is_expired() {
                debug!(cache = %self.cache.display(), "using cached token");
                return Ok(Authentication::Authorized(Session::from_token(token.clone())));
            }
            warn!(cache = %self.cache.display(), "cached token has expired");
        }

        let (Some(id), Some(secret)) = (&self.id, &self.secret) else {
            return Ok(Authentication::MissingCredentials);
        };
        let config = self.oauth_config(id, secret)?;

        let refreshable = cached.filter(|t| t.refresh_token.is_some() && self.code.is_none());
        if let Some(token) = refreshable {
            match config.refresh(&token, &cache).await {
                Ok(token) => return Ok(Authentication::Authorized(Session::from_token(token))),
                Err(e) => warn!(error = %e, "token refresh failed"),
            }
        }

        let Some(code) = &self.code else {
            let state = uuid::Uuid::new_v4().to_string();
            return Ok(Authentication::AuthorizationRequired(
                config.authorize_url(&state),
            ));
        };

        let token = config
            .exchange(code, &cache)
            .await
            .context("exchanging authorization code")?;
        println!("Token is cached in {}", self.cache.display());

        Ok(Authentication::Authorized(Session::from_token(token)))
    }
}
