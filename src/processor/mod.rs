// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Pipeline processors
//!
//! A processor takes a parsed pipeline and runs it on some runtime. Only
//! the local runtime is provided: notebooks run in place, one at a time,
//! in dependency order.

mod dispatcher;
mod local;
mod resolver;
mod response;
mod workspace;

pub use dispatcher::{DispatchReport, NotebookDispatcher};
pub use local::{LocalPipelineProcessor, RunState};
pub use resolver::{PathResolver, RootDirResolver};
pub use response::{OperationReport, ProcessorResponse};
pub use workspace::{RunWorkspace, WorkspaceManager, RUN_TIMESTAMP_FORMAT};

use async_trait::async_trait;
use std::path::Path;

use crate::errors::NbflowResult;
use crate::pipeline::Pipeline;

/// Trait for pipeline processors
#[async_trait]
pub trait PipelineProcessor: Send + Sync {
    /// Runtime type, e.g. `local`
    fn processor_type(&self) -> &str;

    /// Run a pipeline to completion
    async fn process(&self, pipeline: &Pipeline) -> NbflowResult<ProcessorResponse>;

    /// Export a pipeline into a runtime-specific format
    async fn export(
        &self,
        pipeline: &Pipeline,
        format: &str,
        path: &Path,
        overwrite: bool,
    ) -> NbflowResult<ProcessorResponse>;
}
