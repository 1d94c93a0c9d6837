// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

use super::{load_pipeline, report, OutputFormat, ProcessorArgs};
use crate::executors::ExecutionEngine;
use crate::pipeline::{DependencyGraph, PipelineValidator};
use crate::processor::{LocalPipelineProcessor, PipelineProcessor, ProcessorResponse};
use crate::utils::{create_spinner, format_duration, print_header, print_section, print_success};

/// Run the pipeline
pub async fn run(
    pipeline_path: PathBuf,
    args: ProcessorArgs,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let pipeline = load_pipeline(&pipeline_path).map_err(report)?;

    let validation = PipelineValidator::validate(&pipeline).map_err(report)?;
    if !validation.is_valid() {
        eprintln!("{}", "Pipeline validation failed:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(miette::miette!("Pipeline configuration is invalid"));
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Pipeline warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    let config = args.load_config().map_err(report)?;
    let processor = LocalPipelineProcessor::from_config(&config).map_err(report)?;

    if format == OutputFormat::Json {
        let response = processor.process(&pipeline).await.map_err(report)?;
        println!("{}", response.to_json()?);
        return Ok(());
    }

    print_header(&format!("Pipeline: {}", pipeline.name));
    if verbose {
        let engine = processor.engine();
        match engine.version().await {
            Ok(version) => println!("Engine: {} {}", engine.name(), version.dimmed()),
            Err(e) => tracing::debug!("Could not read engine version: {}", e),
        }
        println!("Workspaces: {}", processor.workspaces().base().display());
    }
    print_section("Execution plan");
    let plan = DependencyGraph::build(&pipeline)
        .and_then(|dag| dag.to_text(&pipeline))
        .map_err(report)?;
    for line in plan.lines() {
        println!("  {}", line);
    }
    println!();

    let spinner = create_spinner(&format!(
        "Running {} notebook(s) with {}",
        pipeline.operations.len(),
        processor.processor_type()
    ));
    let result = processor.process(&pipeline).await;
    spinner.finish_and_clear();

    let response = result.map_err(|e| {
        eprintln!("{} {}", "✗".red(), "Pipeline failed".red().bold());
        report(e)
    })?;

    print_summary(&response, verbose);
    Ok(())
}

fn print_summary(response: &ProcessorResponse, verbose: bool) {
    for operation in &response.operations {
        let mut line = format!(
            "{} ({})",
            operation.name,
            format_duration(Duration::from_millis(operation.duration_ms))
        );
        if operation.used_default_environment {
            line.push_str(&" [default environment]".yellow().to_string());
        }
        print_success(&line);

        if verbose {
            println!("      {}", operation.stdout.display().to_string().dimmed());
            println!("      {}", operation.stderr.display().to_string().dimmed());
        }
    }

    println!();
    println!("{} {}", "Pipeline completed:".green().bold(), response.message);
    println!("Workspace: {}", response.workspace.display());
}
