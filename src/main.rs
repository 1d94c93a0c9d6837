// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! nbflow - Local notebook pipelines
//!
//! Run a DAG of notebooks in dependency order.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nbflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "nbflow=debug" } else { "nbflow=info" };

    // Logs go to stderr so `run --format json` output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            pipeline,
            processor,
            format,
        } => nbflow::cli::run::run(pipeline, processor, format, cli.verbose).await,
        Commands::Order { pipeline, format } => {
            nbflow::cli::order::run(pipeline, format, cli.verbose).await
        }
        Commands::Validate {
            pipeline,
            processor,
        } => nbflow::cli::validate::run(pipeline, processor, cli.verbose).await,
        Commands::Export {
            pipeline,
            processor,
            format,
            output,
            overwrite,
        } => nbflow::cli::export::run(pipeline, processor, format, output, overwrite).await,
    }
}
