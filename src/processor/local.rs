// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Local pipeline processor
//!
//! Runs every notebook of a pipeline in place on this machine, as if each
//! were executed by hand with "run all". Properties other than the notebook
//! to execute are ignored. The first failing notebook stops the run.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{
    NotebookDispatcher, OperationReport, PathResolver, PipelineProcessor, ProcessorResponse,
    RootDirResolver, WorkspaceManager,
};
use crate::config::ProcessorConfig;
use crate::errors::{NbflowError, NbflowResult};
use crate::executors::{ExecutionEngine, PapermillEngine};
use crate::pipeline::{execution_order, Pipeline};

/// Where a run currently stands
///
/// Each call to `process` walks its own state from `Idle`; a failure at any
/// point ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Ordering,
    /// Running the `index`-th operation (1-based) of `total`
    Dispatching { index: usize, total: usize },
    Completed,
    Failed,
}

impl RunState {
    /// Whether `next` may follow this state
    pub fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;

        match (*self, next) {
            (Idle, Ordering) => true,
            (Ordering, Dispatching { index: 1, total }) => total >= 1,
            (Ordering, Completed) => true,
            (Dispatching { index, total }, Dispatching { index: i, total: t }) => {
                t == total && i == index + 1 && i <= total
            }
            (Dispatching { index, total }, Completed) => index == total,
            (Idle | Ordering | Dispatching { .. }, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Ordering => write!(f, "ordering"),
            Self::Dispatching { index, total } => write!(f, "dispatching {}/{}", index, total),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Local pipeline processor
pub struct LocalPipelineProcessor {
    resolver: Box<dyn PathResolver>,
    workspaces: WorkspaceManager,
    dispatcher: NotebookDispatcher,
}

impl LocalPipelineProcessor {
    pub const TYPE: &'static str = "local";

    /// Create a processor around an engine
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        resolver: impl PathResolver + 'static,
        workspaces: WorkspaceManager,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            workspaces,
            dispatcher: NotebookDispatcher::new(engine, "python3"),
        }
    }

    /// Environment forced when a notebook's own one cannot be found
    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.dispatcher = NotebookDispatcher::new(self.dispatcher.engine(), environment);
        self
    }

    /// Create a papermill-backed processor from configuration
    pub fn from_config(config: &ProcessorConfig) -> NbflowResult<Self> {
        let engine = PapermillEngine::from_config(&config.engine)?;

        Ok(Self::new(
            Arc::new(engine),
            RootDirResolver::new(config.root_dir()),
            WorkspaceManager::new(config.workspace_base()),
        )
        .with_default_environment(config.default_environment.clone()))
    }

    /// Engine that executes the notebooks
    pub fn engine(&self) -> Arc<dyn ExecutionEngine> {
        self.dispatcher.engine()
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    async fn run(
        &self,
        pipeline: &Pipeline,
        state: &mut RunState,
    ) -> NbflowResult<ProcessorResponse> {
        advance(state, RunState::Ordering);

        let workspace = self.workspaces.allocate(&pipeline.name)?;
        tracing::info!(
            "Processing pipeline: {} as run {} at {}",
            pipeline.name,
            workspace.run_name(),
            workspace.path().display()
        );

        let order = execution_order(&pipeline.operations)?;
        tracing::debug!("Execution order: {}", order.ids().join(" → "));
        let total = order.len();
        let mut reports = Vec::with_capacity(total);

        for (index, operation) in order.into_iter().enumerate() {
            advance(
                state,
                RunState::Dispatching {
                    index: index + 1,
                    total,
                },
            );

            let path = self.resolver.resolve(&operation.filename);
            let report = self.dispatcher.dispatch(&workspace, &path).await?;
            reports.push(OperationReport::from_dispatch(
                &operation.id,
                &operation.name,
                report,
            ));
        }

        advance(state, RunState::Completed);

        Ok(ProcessorResponse {
            message: format!(
                "{} operation{} completed",
                total,
                if total == 1 { "" } else { "s" }
            ),
            workspace: workspace.path().to_path_buf(),
            operations: reports,
        })
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(state.can_advance_to(next), "{} -> {}", state, next);
    tracing::trace!("Run state {} -> {}", state, next);
    *state = next;
}

#[async_trait]
impl PipelineProcessor for LocalPipelineProcessor {
    fn processor_type(&self) -> &str {
        Self::TYPE
    }

    async fn process(&self, pipeline: &Pipeline) -> NbflowResult<ProcessorResponse> {
        let mut state = RunState::Idle;

        let result = self.run(pipeline, &mut state).await;
        if let Err(e) = &result {
            tracing::debug!("Pipeline {} failed while {}: {}", pipeline.name, state, e);
            advance(&mut state, RunState::Failed);
        }

        result
    }

    async fn export(
        &self,
        _pipeline: &Pipeline,
        _format: &str,
        _path: &Path,
        _overwrite: bool,
    ) -> NbflowResult<ProcessorResponse> {
        Err(NbflowError::NotSupported {
            runtime: "Local".to_string(),
            operation: "export".to_string(),
        })
    }
}
