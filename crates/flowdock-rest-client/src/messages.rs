//! Message endpoints and the live message stream

use flowdock_api_contract::validation::{require, validate_comment_options};
use flowdock_api_contract::{ApiContractError, Message, MessageCreateOptions, MessagesListOptions};
use reqwest::Method;
use tracing::warn;
use validator::Validate;

use crate::client::{segment, Endpoint, RestClient};
use crate::error::RestClientResult;
use crate::sse::{subscribe, FlowSubscription};

#[derive(Debug, Clone, Copy)]
pub struct MessagesService<'a> {
    client: &'a RestClient,
}

impl<'a> MessagesService<'a> {
    pub(crate) fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Messages of a flow matching `options`, newest last.
    ///
    /// Never returns more than `options.limit` messages, even if the server
    /// sends more.
    pub async fn list(
        &self,
        org: &str,
        flow: &str,
        options: &MessagesListOptions,
    ) -> RestClientResult<Vec<Message>> {
        options.validate().map_err(ApiContractError::from)?;

        let path = format!("flows/{}/{}/messages", segment(org), segment(flow));
        let mut messages: Vec<Message> = self.client.get_with_query(&path, options).await?;

        if let Some(limit) = options.limit.map(|l| l as usize) {
            if messages.len() > limit {
                warn!(
                    received = messages.len(),
                    limit, "server returned more messages than requested"
                );
                messages.truncate(limit);
            }
        }

        Ok(messages)
    }

    /// Post a message. `flow` and `event` are required.
    pub async fn create(&self, options: Option<&MessageCreateOptions>) -> RestClientResult<Message> {
        let options = require(options, "message create options")?;
        self.client.send_json(Method::POST, "messages", options).await
    }

    /// Post a comment on the message whose id is `options.message`.
    pub async fn create_comment(
        &self,
        options: Option<&MessageCreateOptions>,
    ) -> RestClientResult<Message> {
        let options = options.ok_or(ApiContractError::MissingOptions("comment create options"))?;
        validate_comment_options(options)?;
        self.client.send_json(Method::POST, "comments", options).await
    }

    /// Subscribe to new messages of a flow on the streaming host.
    ///
    /// `token` is an OAuth access token; it travels in the query string so
    /// the stream URL is never logged.
    pub fn stream(&self, token: &str, org: &str, flow: &str) -> RestClientResult<FlowSubscription> {
        let path = format!("flows/{}/{}", segment(org), segment(flow));
        let mut url = self.client.url_for(Endpoint::Stream, &path)?;
        url.query_pairs_mut().append_pair("access_token", token);

        let headers = self.client.auth().headers()?;
        subscribe(
            &url,
            &headers,
            self.client.stream_config(),
            format!("{org}/{flow}"),
        )
    }
}
