// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Validate command - check pipeline structure and notebooks

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{report, ProcessorArgs};
use crate::executors::{ExecutionEngine, PapermillEngine};
use crate::pipeline::{Pipeline, PipelineValidator};
use crate::processor::RootDirResolver;
use crate::utils::{print_error, print_success, print_warning};

/// Run the validate command
pub async fn run(pipeline_path: PathBuf, args: ProcessorArgs, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let pipeline = match Pipeline::from_file(&pipeline_path) {
        Ok(p) => p,
        Err(e) => {
            print_error("Failed to parse pipeline");
            println!();
            return Err(report(e));
        }
    };

    print_success("Pipeline file parsed");

    let validation = PipelineValidator::validate(&pipeline).map_err(report)?;

    let config = args.load_config().map_err(report)?;
    let resolver = RootDirResolver::new(config.root_dir());
    let missing_files = PipelineValidator::validate_files(&pipeline, &resolver);

    let engine = PapermillEngine::with_command(&config.engine.command, config.engine.args.clone());
    let engine_available = engine.check_available().await;

    let mut has_issues = false;

    if !validation.errors.is_empty() {
        has_issues = true;
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            print_error(error);
        }
    }

    if !missing_files.is_empty() {
        has_issues = true;
        println!();
        println!("{}:", "Missing notebooks".yellow().bold());
        for missing in &missing_files {
            print_warning(missing);
        }
    }

    if !engine_available {
        println!();
        print_warning(&format!(
            "Execution engine '{}' not found; 'nbflow run' will fail",
            config.engine.command
        ));
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", pipeline.name);
        println!("  Root directory: {}", resolver.root_dir().display());
        println!("  Operations: {}", pipeline.operations.len());
        for operation in &pipeline.operations {
            let deps = if operation.is_root() {
                String::new()
            } else {
                format!(" [depends: {}]", operation.parent_operations.join(", "))
            };
            println!(
                "    - {} ({}){}",
                operation.id,
                operation.filename.display(),
                deps.dimmed()
            );
        }
    }

    println!();

    if has_issues {
        Err(miette::miette!("Pipeline validation failed"))
    } else if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
        Ok(())
    }
}
