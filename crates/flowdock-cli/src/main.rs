use std::process;
use std::sync::Arc;

use anyhow::Result;
use flowdock_cli::auth::{Authentication, USAGE};
use flowdock_cli::{Cli, CommandFactory, Commands, Parser};
use flowdock_rest_client::RestClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Deploys(args) = &cli.command {
        if args.apps.is_empty() {
            let mut command = Cli::command();
            if let Some(deploys) = command.find_subcommand_mut("deploys") {
                let _ = deploys.print_help();
            }
            process::exit(1);
        }
    }

    let session = match cli.auth.authenticate().await? {
        Authentication::Authorized(session) => session,
        Authentication::MissingCredentials => {
            let _ = Cli::command().print_help();
            eprint!("{USAGE}");
            process::exit(2);
        }
        Authentication::AuthorizationRequired(url) => {
            println!("Visit this URL to get a code, then run again with --code=YOUR_CODE\n");
            println!("{url}");
            return Ok(());
        }
    };

    let client = RestClient::from_urls(&cli.api_url, &cli.stream_url, session.auth.clone())?;

    match cli.command {
        Commands::Deploys(args) => args.run(Arc::new(client)).await,
        Commands::Search(args) => args.run(&client).await,
        Commands::Stream(args) => args.run(&client, &session).await,
        Commands::Integration(args) => args.run(&client).await,
    }
}
