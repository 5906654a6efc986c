//! webfinger - command line WebFinger client.
//!
//! A thin wrapper over the `webfinger` library: looks up a single resource
//! and prints its JRD as indented JSON.

mod cli;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use webfinger::{Client, Jrd};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(jrd) => match output::json_pretty(&jrd) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                output::error(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Jrd> {
    let rels: Vec<&str> = cli.rels.iter().map(String::as_str).collect();

    // The protocol mandates HTTPS, but plenty of development servers only
    // speak HTTP.
    let client = Client::new().allow_http(!cli.https_only);

    client
        .lookup(&cli.resource, &rels)
        .await
        .with_context(|| format!("WebFinger lookup for '{}' failed", cli.resource))
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries the document; logs go to stderr.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
