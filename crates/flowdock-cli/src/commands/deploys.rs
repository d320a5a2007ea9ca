//! `flowdock deploys`: deploy counts per month for a set of applications

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use flowdock_api_contract::{MessagesListOptions, TagMode};
use flowdock_client_api::ClientApi;
use tokio::sync::mpsc;
use tracing::debug;

use crate::report::{DeployCount, PAGE_LIMIT};

/// Search text identifying deploy notifications
const DEPLOY_SEARCH: &str = "production to production";

#[derive(Args, Debug, Clone)]
pub struct DeploysArgs {
    /// Applications to report on
    pub apps: Vec<String>,

    /// The deploy target
    #[arg(short, long, default_value = "production")]
    pub environment: String,

    /// Organization owning the flow
    #[arg(short, long)]
    pub organization: String,

    /// Flow that receives deploy notifications
    #[arg(short, long)]
    pub flow: String,
}

impl DeploysArgs {
    /// Search for the deploy notifications of one application.
    pub fn query(&self, app: &str) -> MessagesListOptions {
        MessagesListOptions {
            event: Some("mail".into()),
            limit: Some(PAGE_LIMIT),
            tags: vec![
                "deployment".into(),
                "deploy_end".into(),
                self.environment.clone(),
                app.to_string(),
            ],
            tag_mode: Some(TagMode::And),
            search: Some(DEPLOY_SEARCH.into()),
            ..Default::default()
        }
    }

    /// Count deploys for every app concurrently, one task per app.
    ///
    /// Reports come back in completion order.
    pub async fn count(&self, client: Arc<dyn ClientApi>) -> Result<Vec<DeployCount>> {
        let (tx, mut rx) = mpsc::channel(self.apps.len().max(1));
        let mut tasks = Vec::with_capacity(self.apps.len());

        for app in &self.apps {
            let client = Arc::clone(&client);
            let tx = tx.clone();
            let app = app.clone();
            let options = self.query(&app);
            let org = self.organization.clone();
            let flow = self.flow.clone();
            let task_app = app.clone();

            let task = tokio::spawn(async move {
                let result = client
                    .list_messages(&org, &flow, &options)
                    .await
                    .map(|messages| {
                        debug!(app = %app, messages = messages.len(), "deploy search finished");
                        DeployCount::from_messages(app.clone(), &messages, PAGE_LIMIT as usize)
                    });
                let _ = tx.send((app, result)).await;
            });
            tasks.push((task_app, task));
        }
        drop(tx);

        let mut reports = Vec::with_capacity(self.apps.len());
        while let Some((app, result)) = rx.recv().await {
            reports.push(result.with_context(|| format!("counting deploys of {app}"))?);
        }

        // A task that panicked never sent its report.
        for (app, task) in tasks {
            task.await
                .with_context(|| format!("counting deploys of {app}"))?;
        }
        Ok(reports)
    }

    pub async fn run(self, client: Arc<dyn ClientApi>) -> Result<()> {
        for report in self.count(client).await? {
            print!("{report}");
        }
        Ok(())
    }
}
