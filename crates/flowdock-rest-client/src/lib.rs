//! REST and streaming API client for Flowdock
//!
//! [`RestClient`] wraps the REST host (`api.flowdock.com`) and the streaming
//! host (`stream.flowdock.com`). Resource operations are grouped into borrowed
//! service views (`client.flows()`, `client.messages()`, ...). Live message
//! streams are consumed through [`FlowSubscription`], and [`oauth`] covers the
//! authorization-code flow and token caching used by command-line tools.

pub mod auth;
pub mod client;
pub mod error;
pub mod flows;
pub mod inbox;
pub mod messages;
pub mod oauth;
pub mod organizations;
pub mod sse;
pub mod users;

pub use auth::*;
pub use client::*;
pub use error::*;
pub use oauth::{CredentialStore, FileTokenCache, OAuthConfig, Token};
pub use sse::{ErrorReceiver, FlowSubscription, MessageReceiver, StreamConfig, SubscriptionHandle};

use async_trait::async_trait;
use flowdock_api_contract::*;
use flowdock_client_api::{ClientApi, ClientApiError, ClientApiResult};

fn to_client_api_error(e: RestClientError) -> ClientApiError {
    match e {
        RestClientError::Config(_) | RestClientError::Url(_) | RestClientError::Auth(_) => {
            ClientApiError::Unexpected(e.to_string())
        }
        other => ClientApiError::Server(other.to_string()),
    }
}

#[async_trait]
impl ClientApi for client::RestClient {
    async fn list_messages(
        &self,
        org: &str,
        flow: &str,
        options: &MessagesListOptions,
    ) -> ClientApiResult<Vec<Message>> {
        self.messages()
            .list(org, flow, options)
            .await
            .map_err(to_client_api_error)
    }

    async fn list_users(&self) -> ClientApiResult<Vec<User>> {
        self.users().all().await.map_err(to_client_api_error)
    }

    async fn get_flow(&self, org: &str, flow: &str) -> ClientApiResult<Flow> {
        self.flows().get(org, flow).await.map_err(to_client_api_error)
    }
}
