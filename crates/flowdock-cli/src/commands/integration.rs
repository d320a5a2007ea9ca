//! `flowdock integration`: smoke test against the live service
//!
//! Reads flows, posts a message and a comment on it, then lists the flow's
//! messages. With `--inbox-token` it also pushes an item to the team inbox.

use anyhow::{Context, Result};
use clap::Args;
use flowdock_api_contract::{
    Flow, FlowsListOptions, InboxCreateOptions, Message, MessageCreateOptions, MessagesListOptions,
};
use flowdock_rest_client::RestClient;

use crate::display::{content_text, id_text};

#[derive(Args, Debug, Clone)]
pub struct IntegrationArgs {
    #[arg(short, long)]
    pub organization: String,

    /// Flow to post test messages to
    #[arg(short, long)]
    pub flow: String,

    /// API token of the flow; enables the team inbox check
    #[arg(long)]
    pub inbox_token: Option<String>,
}

impl IntegrationArgs {
    fn flow_id(&self) -> String {
        format!("{}:{}", self.organization, self.flow)
    }

    pub fn message_options(&self) -> MessageCreateOptions {
        MessageCreateOptions {
            flow: self.flow_id(),
            event: "message".into(),
            content: Some("Howdy-Doo #awesome".into()),
            tags: vec!["test".into(), ":#api:".into()],
            ..Default::default()
        }
    }

    pub fn comment_options(&self, parent: i64) -> MessageCreateOptions {
        MessageCreateOptions {
            flow: self.flow_id(),
            event: "comment".into(),
            message: Some(parent),
            content: Some("Commenting yo!".into()),
            ..Default::default()
        }
    }

    pub fn inbox_options() -> InboxCreateOptions {
        InboxCreateOptions {
            source: Some("flowdock-cli".into()),
            from_name: Some("CI".into()),
            from_address: Some("build+ok@flowdock.com".into()),
            subject: Some("Integration check passed".into()),
            content: Some("<p>flowdock integration ran successfully</p>".into()),
            tags: vec!["CI".into(), "test".into()],
            ..Default::default()
        }
    }

    pub async fn run(self, client: &RestClient) -> Result<()> {
        let flows = client.flows();

        let flow = flows
            .get(&self.organization, &self.flow)
            .await
            .context("getting flow")?;
        print_flow(&flow);

        let flow = flows
            .get_by_id(&self.flow_id())
            .await
            .context("getting flow by id")?;
        print_flow(&flow);

        let all = FlowsListOptions {
            all: true,
            users: true,
        };
        for flow in flows.list(&all).await.context("listing flows")? {
            print_flow(&flow);
        }

        let messages = client.messages();
        let message = messages
            .create(Some(&self.message_options()))
            .await
            .context("posting message")?;
        print_message(&message);

        let parent = message.id.context("posted message has no id")?;
        let comment = messages
            .create_comment(Some(&self.comment_options(parent)))
            .await
            .context("posting comment")?;
        print_message(&comment);

        let recent = MessagesListOptions {
            event: Some("message,comment".into()),
            limit: Some(100),
            ..Default::default()
        };
        for message in messages
            .list(&self.organization, &self.flow, &recent)
            .await
            .context("listing messages")?
        {
            print_message(&message);
        }

        if let Some(token) = &self.inbox_token {
            let item = client
                .inbox()
                .create(token, Some(&Self::inbox_options()))
                .await
                .context("posting to team inbox")?;
            print_message(&item);
        }

        Ok(())
    }
}

fn print_flow(flow: &Flow) {
    let org = flow
        .organization
        .as_ref()
        .and_then(|o| o.name.as_deref())
        .unwrap_or("-");
    println!(
        "Flow: {} {} {} {}",
        flow.id.as_deref().unwrap_or("-"),
        flow.name.as_deref().unwrap_or("-"),
        org,
        flow.url.as_deref().unwrap_or("-")
    );
}

fn print_message(message: &Message) {
    println!(
        "MSG: {} {} {}",
        id_text(message.id),
        message.event.as_deref().unwrap_or("-"),
        content_text(message)
    );
}
