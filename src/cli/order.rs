// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Order command - print the execution order or the dependency graph

use miette::Result;
use std::path::PathBuf;

use super::{load_pipeline, report, GraphFormat};
use crate::pipeline::DependencyGraph;

/// Run the order command
pub async fn run(pipeline_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    let pipeline = load_pipeline(&pipeline_path).map_err(report)?;

    let dag = DependencyGraph::build(&pipeline).map_err(report)?;

    let output = match format {
        GraphFormat::Text => dag.to_text(&pipeline).map_err(report)?,
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
