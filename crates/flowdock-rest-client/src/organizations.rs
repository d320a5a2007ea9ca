//! Organization endpoints

use flowdock_api_contract::validation::require;
use flowdock_api_contract::{FindOptions, Organization, OrganizationUpdateOptions};
use reqwest::Method;

use crate::client::{segment, RestClient};
use crate::error::RestClientResult;

#[derive(Debug, Clone, Copy)]
pub struct OrganizationsService<'a> {
    client: &'a RestClient,
}

impl<'a> OrganizationsService<'a> {
    pub(crate) fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Organizations the authenticated user belongs to.
    pub async fn all(&self) -> RestClientResult<Vec<Organization>> {
        self.client.get("organizations").await
    }

    pub async fn get_by_name(&self, parameterized_name: &str) -> RestClientResult<Organization> {
        let path = format!("organizations/{}", segment(parameterized_name));
        self.client.get(&path).await
    }

    pub async fn get_by_id(&self, id: i64) -> RestClientResult<Organization> {
        let options = FindOptions { id: id.to_string() };
        self.client.get_with_query("organizations/find", &options).await
    }

    /// Requires admin rights in the organization.
    pub async fn update(
        &self,
        id: i64,
        options: Option<&OrganizationUpdateOptions>,
    ) -> RestClientResult<Organization> {
        let options = require(options, "organization update options")?;
        self.client
            .send_json(Method::PUT, &format!("organizations/{id}"), options)
            .await
    }
}
