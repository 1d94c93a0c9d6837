// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! # nbflow - Local notebook pipelines
//!
//! `nbflow` runs a directed acyclic graph of notebooks on the local machine,
//! one at a time, in dependency order.
//!
//! ## Features
//!
//! - **Deterministic ordering** - Parents first, declaration order otherwise
//! - **Cycle detection** - Cyclic pipelines are rejected before anything runs
//! - **Captured output** - Each notebook's stdout/stderr lands in a per-run workspace
//! - **Environment fallback** - A missing kernel is retried once with a default one
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the execution order
//! nbflow order pipeline.yaml
//!
//! # Check the pipeline and its notebooks
//! nbflow validate pipeline.yaml
//!
//! # Run it
//! nbflow run pipeline.yaml
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod processor;
pub mod utils;

// Re-export commonly used types
pub use config::ProcessorConfig;
pub use errors::{NbflowError, NbflowResult};
pub use pipeline::{execution_order, Operation, OperationMap, Pipeline};
pub use processor::{LocalPipelineProcessor, PipelineProcessor, ProcessorResponse};
