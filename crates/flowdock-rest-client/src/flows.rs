//! Flow endpoints

use flowdock_api_contract::validation::require;
use flowdock_api_contract::{FindOptions, Flow, FlowCreateOptions, FlowsListOptions};
use reqwest::Method;

use crate::client::{segment, RestClient};
use crate::error::RestClientResult;

/// Flow operations, borrowed from a [`RestClient`]
#[derive(Debug, Clone, Copy)]
pub struct FlowsService<'a> {
    client: &'a RestClient,
}

impl<'a> FlowsService<'a> {
    pub(crate) fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Flows the user has joined, or every flow in the user's organizations
    /// when `options.all` is set.
    pub async fn list(&self, options: &FlowsListOptions) -> RestClientResult<Vec<Flow>> {
        let path = if options.all { "flows/all" } else { "flows" };
        self.client.get_with_query(path, options).await
    }

    /// A single flow, including its member list.
    pub async fn get(&self, org: &str, flow: &str) -> RestClientResult<Flow> {
        let path = format!("flows/{}/{}", segment(org), segment(flow));
        self.client.get(&path).await
    }

    /// Look a flow up by its opaque id.
    pub async fn get_by_id(&self, id: &str) -> RestClientResult<Flow> {
        let options = FindOptions { id: id.to_string() };
        self.client.get_with_query("flows/find", &options).await
    }

    pub async fn create(
        &self,
        org: &str,
        options: Option<&FlowCreateOptions>,
    ) -> RestClientResult<Flow> {
        let options = require(options, "flow create options")?;
        let path = format!("flows/{}", segment(org));
        self.client.send_json(Method::POST, &path, options).await
    }

    /// Send the set fields of `flow` as a partial update.
    pub async fn update(&self, org: &str, flow_name: &str, flow: &Flow) -> RestClientResult<Flow> {
        let path = format!("flows/{}/{}", segment(org), segment(flow_name));
        self.client.send_json(Method::PUT, &path, flow).await
    }
}
