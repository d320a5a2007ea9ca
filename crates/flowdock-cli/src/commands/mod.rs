//! Subcommand implementations

pub mod deploys;
pub mod integration;
pub mod search;
pub mod stream;
