// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
mod config;
mod ctl;
mod heartbeat;
mod selection;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use cli::Args;
use config::{Config, TOKEN_ENV};
use ctl::Ctl;
use heartbeat::OpsGenieClient;

/// Initialize logging to stderr so command output on stdout stays clean
fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let filter = if verbose {
        "heartbeatctl=debug"
    } else {
        "heartbeatctl=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = Config::load()?.resolve(args.api_url.clone(), std::env::var(TOKEN_ENV).ok())?;
    tracing::debug!(api_url = %settings.api_url, "Using OpsGenie API");

    let client = OpsGenieClient::new(&settings.api_url, settings.api_key)
        .context("Failed to create OpsGenie client")?;
    let ctl = Ctl::new(Arc::new(client));

    let mut stdout = std::io::stdout();
    cli::run(&ctl, &args.command, args.no_headers, &mut stdout).await
}
