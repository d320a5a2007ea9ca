//! Team inbox pushes, authenticated by the flow's API token

use flowdock_api_contract::validation::require;
use flowdock_api_contract::{InboxCreateOptions, Message};
use reqwest::Method;

use crate::client::{segment, RestClient};
use crate::error::RestClientResult;

#[derive(Debug, Clone, Copy)]
pub struct InboxService<'a> {
    client: &'a RestClient,
}

impl<'a> InboxService<'a> {
    pub(crate) fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Post a mail-style item to the inbox of the flow owning `flow_token`.
    pub async fn create(
        &self,
        flow_token: &str,
        options: Option<&InboxCreateOptions>,
    ) -> RestClientResult<Message> {
        let options = require(options, "inbox create options")?;
        let path = format!("messages/team_inbox/{}", segment(flow_token));
        self.client.send_json(Method::POST, &path, options).await
    }
}
