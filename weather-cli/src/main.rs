//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the location permission prompt
//! - Human-friendly output formatting

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod locator;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so stdout only carries rendered output.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default = if verbose { "weather_core=debug,weather=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(env_filter).with_target(true).with_writer(std::io::stderr).init();
}
