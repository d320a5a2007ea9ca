//! Client API trait consumed by the Flowdock command-line tools

use async_trait::async_trait;
use flowdock_api_contract::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientApiError {
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected: {0}")]
    Unexpected(String),
}

pub type ClientApiResult<T> = Result<T, ClientApiError>;

#[async_trait]
pub trait ClientApi: Send + Sync {
    async fn list_messages(
        &self,
        org: &str,
        flow: &str,
        options: &MessagesListOptions,
    ) -> ClientApiResult<Vec<Message>>;

    async fn list_users(&self) -> ClientApiResult<Vec<User>>;

    async fn get_flow(&self, org: &str, flow: &str) -> ClientApiResult<Flow>;
}
