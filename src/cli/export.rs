// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Export command - convert the pipeline for another runtime

use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::{load_pipeline, report, ProcessorArgs};
use crate::executors::PapermillEngine;
use crate::processor::{
    LocalPipelineProcessor, PipelineProcessor, RootDirResolver, WorkspaceManager,
};

/// Run the export command
pub async fn run(
    pipeline_path: PathBuf,
    args: ProcessorArgs,
    format: String,
    output: PathBuf,
    overwrite: bool,
) -> Result<()> {
    let pipeline = load_pipeline(&pipeline_path).map_err(report)?;
    let config = args.load_config().map_err(report)?;

    // Exporting never runs a notebook, so the engine is not looked up
    let engine = PapermillEngine::with_command(&config.engine.command, config.engine.args.clone());
    let processor = LocalPipelineProcessor::new(
        Arc::new(engine),
        RootDirResolver::new(config.root_dir()),
        WorkspaceManager::new(config.workspace_base()),
    );

    let response = processor
        .export(&pipeline, &format, &output, overwrite)
        .await
        .map_err(report)?;

    println!("{}", response.message);
    Ok(())
}
