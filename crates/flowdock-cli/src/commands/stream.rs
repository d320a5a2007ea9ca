//! `flowdock stream`: recent history, then live messages from several flows

use anyhow::{Context, Result};
use clap::Args;
use flowdock_api_contract::{Message, MessagesListOptions};
use flowdock_rest_client::RestClient;
use futures::stream::{select_all, StreamExt};
use tracing::{info, warn};

use crate::auth::Session;
use crate::display::{chat_line, UserDirectory};

#[derive(Args, Debug, Clone)]
pub struct StreamArgs {
    #[arg(short, long)]
    pub organization: String,

    /// Flows to follow
    #[arg(required = true)]
    pub flows: Vec<String>,

    /// Recent messages to print per flow before following
    #[arg(short, long, default_value_t = 100)]
    pub limit: u32,
}

impl StreamArgs {
    pub async fn run(self, client: &RestClient, session: &Session) -> Result<()> {
        let users = UserDirectory::new(client.users().all().await.context("listing users")?);
        info!(users = users.len(), "user directory loaded");

        let recent = MessagesListOptions {
            limit: Some(self.limit),
            ..Default::default()
        };
        for flow in &self.flows {
            let messages = client
                .messages()
                .list(&self.organization, flow, &recent)
                .await
                .with_context(|| format!("listing messages of {flow}"))?;
            print_all(&users, flow, messages);
        }

        let mut handles = Vec::with_capacity(self.flows.len());
        let mut message_streams = Vec::with_capacity(self.flows.len());
        let mut error_streams = Vec::with_capacity(self.flows.len());

        for flow in &self.flows {
            let subscription = client
                .messages()
                .stream(&session.token, &self.organization, flow)
                .with_context(|| format!("subscribing to {flow}"))?;
            let (messages, errors, handle) = subscription.split();

            let room = flow.clone();
            message_streams.push(messages.map(move |m| (room.clone(), m)).boxed());
            let room = flow.clone();
            error_streams.push(errors.map(move |e| (room.clone(), e)).boxed());
            handles.push(handle);
        }

        let mut messages = select_all(message_streams);
        let mut errors = select_all(error_streams);
        println!("Waiting for events");

        loop {
            tokio::select! {
                item = messages.next() => match item {
                    Some((room, message)) => {
                        if let Some(line) = chat_line(&message, &room, &users) {
                            println!("\n{line}");
                        }
                    }
                    None => break,
                },
                Some((room, error)) = errors.next() => {
                    warn!(flow = %room, error = %error, "stream error");
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        for handle in handles {
            handle.close().await;
        }
        Ok(())
    }
}

fn print_all(users: &UserDirectory, room: &str, messages: Vec<Message>) {
    for message in &messages {
        if let Some(line) = chat_line(message, room, users) {
            println!("\n{line}");
        }
    }
}
