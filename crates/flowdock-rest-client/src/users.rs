//! User endpoints

use flowdock_api_contract::validation::require;
use flowdock_api_contract::{User, UserUpdateOptions};
use reqwest::Method;

use crate::client::{segment, RestClient};
use crate::error::RestClientResult;

#[derive(Debug, Clone, Copy)]
pub struct UsersService<'a> {
    client: &'a RestClient,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Every user visible to the authenticated user.
    pub async fn all(&self) -> RestClientResult<Vec<User>> {
        self.client.get("users").await
    }

    /// Members of one flow.
    pub async fn list(&self, org: &str, flow: &str) -> RestClientResult<Vec<User>> {
        let path = format!("flows/{}/{}/users", segment(org), segment(flow));
        self.client.get(&path).await
    }

    pub async fn get(&self, id: i64) -> RestClientResult<User> {
        self.client.get(&format!("users/{id}")).await
    }

    pub async fn update(
        &self,
        id: i64,
        options: Option<&UserUpdateOptions>,
    ) -> RestClientResult<User> {
        let options = require(options, "user update options")?;
        self.client
            .send_json(Method::PUT, &format!("users/{id}"), options)
            .await
    }
}
