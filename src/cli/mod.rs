// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for nbflow.

pub mod export;
pub mod order;
pub mod run;
pub mod validate;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::ProcessorConfig;
use crate::errors::NbflowError;
use crate::pipeline::Pipeline;

/// Notebook pipeline runner
///
/// Run a DAG of notebooks locally, in dependency order.
#[derive(Parser, Debug)]
#[clap(
    name = "nbflow",
    version,
    about = "Run notebook pipelines locally in dependency order",
    long_about = None,
    after_help = "Examples:\n\
        nbflow order pipeline.yaml          Show the execution order\n\
        nbflow validate pipeline.yaml       Check the pipeline for problems\n\
        nbflow run pipeline.yaml            Execute every notebook\n\n\
        See 'nbflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run {
        /// Pipeline file (.yaml or .json)
        pipeline: PathBuf,

        #[clap(flatten)]
        processor: ProcessorArgs,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the execution order or the dependency graph
    Order {
        /// Pipeline file (.yaml or .json)
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Validate pipeline structure and referenced notebooks
    Validate {
        /// Pipeline file (.yaml or .json)
        pipeline: PathBuf,

        #[clap(flatten)]
        processor: ProcessorArgs,
    },

    /// Export the pipeline to a runtime-specific format
    Export {
        /// Pipeline file (.yaml or .json)
        pipeline: PathBuf,

        #[clap(flatten)]
        processor: ProcessorArgs,

        /// Export format
        #[clap(short, long)]
        format: String,

        /// Destination file
        #[clap(short, long)]
        output: PathBuf,

        /// Replace the destination if it exists
        #[clap(long)]
        overwrite: bool,
    },
}

/// Processor settings shared by the commands that touch notebooks
#[derive(Args, Debug, Clone, Default)]
pub struct ProcessorArgs {
    /// Base directory for relative notebook paths
    #[clap(long, env = "NBFLOW_ROOT_DIR", value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Parent directory of the run workspaces
    #[clap(long, env = "NBFLOW_WORKSPACE_ROOT", value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Environment forced when a notebook's own one is missing
    #[clap(long, env = "NBFLOW_DEFAULT_ENV", value_name = "ENV")]
    pub default_env: Option<String>,

    /// Configuration file (default: ./.nbflow.yaml when present)
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ProcessorArgs {
    /// Load configuration and apply command-line overrides
    pub fn load_config(&self) -> Result<ProcessorConfig, NbflowError> {
        let mut config = match &self.config {
            Some(path) => ProcessorConfig::from_file(path)?,
            None => ProcessorConfig::discover(&std::env::current_dir()?)?,
        };

        if let Some(root_dir) = &self.root_dir {
            config.root_dir = Some(root_dir.clone());
        }
        if let Some(workspace_root) = &self.workspace_root {
            config.workspace_root = Some(workspace_root.clone());
        }
        if let Some(env) = &self.default_env {
            config.default_environment = env.clone();
        }

        Ok(config)
    }
}

/// Output format for the run command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Output format for the order command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Load a pipeline file, printing a hint when it is missing
pub(crate) fn load_pipeline(path: &Path) -> Result<Pipeline, NbflowError> {
    Pipeline::from_file(path).map_err(|e| {
        if matches!(e, NbflowError::PipelineNotFound { .. }) {
            eprintln!(
                "{} Pipeline files are YAML or JSON with 'name' and 'operations'",
                "hint:".cyan()
            );
        }
        e
    })
}

/// Print the recovery steps for an error, if any, and hand the error back
pub(crate) fn report(error: NbflowError) -> miette::Report {
    if let Some(suggestion) = error.recovery() {
        eprintln!();
        eprintln!("{}", suggestion);
    }
    miette::Report::new(error)
}
