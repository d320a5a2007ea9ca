//! `flowdock search`: list a flow's messages matching tags, event and text

use anyhow::Result;
use clap::Args;
use flowdock_api_contract::{Message, MessagesListOptions, TagMode};
use flowdock_client_api::ClientApi;

use crate::display::search_line;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(short, long)]
    pub organization: String,

    #[arg(short, long)]
    pub flow: String,

    /// Tag to match; repeat for several
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Match any tag instead of all of them
    #[arg(long)]
    pub any_tag: bool,

    /// Event type filter, e.g. "mail" or "message,comment"
    #[arg(short, long)]
    pub event: Option<String>,

    /// Full-text search
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(short, long, default_value_t = 100)]
    pub limit: u32,
}

impl SearchArgs {
    pub fn options(&self) -> MessagesListOptions {
        MessagesListOptions {
            event: self.event.clone(),
            limit: Some(self.limit),
            tags: self.tags.clone(),
            tag_mode: Some(if self.any_tag { TagMode::Or } else { TagMode::And }),
            search: self.search.clone(),
            ..Default::default()
        }
    }

    pub async fn search(&self, client: &dyn ClientApi) -> Result<Vec<Message>> {
        Ok(client
            .list_messages(&self.organization, &self.flow, &self.options())
            .await?)
    }

    pub async fn run(self, client: &dyn ClientApi) -> Result<()> {
        let messages = self.search(client).await?;
        for message in &messages {
            println!("{}", search_line(message));
        }
        println!("Count: {}", messages.len());
        Ok(())
    }
}
