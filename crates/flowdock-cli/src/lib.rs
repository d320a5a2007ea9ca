//! Flowdock command-line tools library

pub mod auth;
pub mod commands;
pub mod display;
pub mod report;

// Re-export CLI types for testing
pub use clap::{CommandFactory, Parser, Subcommand};

use flowdock_rest_client::{DEFAULT_REST_URL, DEFAULT_STREAM_URL};

#[derive(Parser)]
#[command(name = "flowdock")]
#[command(about = "Command-line tools for the Flowdock API")]
#[command(version, author, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub auth: auth::AuthArgs,

    /// Base URL of the REST API
    #[arg(long, global = true, default_value = DEFAULT_REST_URL)]
    pub api_url: String,

    /// Base URL of the streaming API
    #[arg(long, global = true, default_value = DEFAULT_STREAM_URL)]
    pub stream_url: String,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count deploys per month for the listed applications
    Deploys(commands::deploys::DeploysArgs),
    /// Search a flow's messages by tag, event and text
    Search(commands::search::SearchArgs),
    /// Print recent messages, then follow one or more flows live
    Stream(commands::stream::StreamArgs),
    /// Exercise flows, messages, comments and the team inbox against the live service
    Integration(commands::integration::IntegrationArgs),
}
