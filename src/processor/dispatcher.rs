// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Notebook dispatcher
//!
//! Runs one notebook in place through the execution engine, capturing its
//! output streams into the run workspace. When the environment embedded in
//! the notebook cannot be found, the run is retried once with the default
//! environment. Any other failure, or a failing retry, is fatal.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::NbflowError;
use crate::executors::{EngineFailure, EngineRequest, ExecutionEngine};
use crate::processor::RunWorkspace;

/// Outcome of a successful dispatch
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Notebook that was executed
    pub path: PathBuf,
    /// Duration of the successful attempt
    pub duration: Duration,
    /// Whether the default environment had to be forced
    pub used_default_environment: bool,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

/// Capture files of one notebook run, closed when dropped
struct CaptureFiles {
    stdout: File,
    stderr: File,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
}

impl CaptureFiles {
    fn create(workspace: &RunWorkspace, notebook_name: &str) -> Result<Self, NbflowError> {
        let stdout_path = workspace.stdout_path(notebook_name);
        let stderr_path = workspace.stderr_path(notebook_name);

        Ok(Self {
            stdout: open_capture(&stdout_path)?,
            stderr: open_capture(&stderr_path)?,
            stdout_path,
            stderr_path,
        })
    }
}

fn open_capture(path: &Path) -> Result<File, NbflowError> {
    // readable too, so the engine can inspect what a failed attempt printed
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| NbflowError::Io {
            message: format!("failed to create capture file {}: {}", path.display(), e),
        })
}

/// Dispatches notebooks to an execution engine
pub struct NotebookDispatcher {
    engine: Arc<dyn ExecutionEngine>,
    default_environment: String,
}

impl NotebookDispatcher {
    pub fn new(engine: Arc<dyn ExecutionEngine>, default_environment: impl Into<String>) -> Self {
        Self {
            engine,
            default_environment: default_environment.into(),
        }
    }

    pub fn engine(&self) -> Arc<dyn ExecutionEngine> {
        Arc::clone(&self.engine)
    }

    /// Execute the notebook at `path`, capturing output into `workspace`
    pub async fn dispatch(
        &self,
        workspace: &RunWorkspace,
        path: &Path,
    ) -> Result<DispatchReport, NbflowError> {
        if !path.is_file() {
            return Err(NbflowError::document_not_found(path.to_path_buf()));
        }

        let notebook_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let notebook_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let captures = CaptureFiles::create(workspace, &notebook_name)?;

        tracing::debug!("Processing: {}", path.display());

        let mut start = Instant::now();
        let mut used_default_environment = false;

        match self.attempt(path, notebook_dir, &captures, None).await {
            Ok(()) => {}
            Err(failure) if failure.is_environment_not_found() => {
                tracing::warn!(
                    "Environment of {} not found, retrying with '{}'",
                    notebook_name,
                    self.default_environment
                );
                used_default_environment = true;
                start = Instant::now();

                let forced = Some(self.default_environment.as_str());
                if let Err(cause) = self.attempt(path, notebook_dir, &captures, forced).await {
                    tracing::error!(
                        "Internal error executing {} with default environment",
                        path.display()
                    );
                    return Err(NbflowError::ExecutionFailed {
                        path: path.to_path_buf(),
                        workspace: workspace.path().to_path_buf(),
                        default_environment: Some(self.default_environment.clone()),
                        cause,
                    });
                }
            }
            Err(cause) => {
                tracing::error!("Internal error executing {}", path.display());
                return Err(NbflowError::ExecutionFailed {
                    path: path.to_path_buf(),
                    workspace: workspace.path().to_path_buf(),
                    default_environment: None,
                    cause,
                });
            }
        }

        let duration = start.elapsed();
        tracing::debug!(
            "Execution of {} took {:.3} secs.",
            notebook_name,
            duration.as_secs_f64()
        );

        Ok(DispatchReport {
            path: path.to_path_buf(),
            duration,
            used_default_environment,
            stdout: captures.stdout_path.clone(),
            stderr: captures.stderr_path.clone(),
        })
    }

    async fn attempt(
        &self,
        path: &Path,
        notebook_dir: &Path,
        captures: &CaptureFiles,
        environment: Option<&str>,
    ) -> Result<(), EngineFailure> {
        let request = EngineRequest {
            input_path: path,
            output_path: path,
            stdout: &captures.stdout,
            stderr: &captures.stderr,
            stdout_path: &captures.stdout_path,
            stderr_path: &captures.stderr_path,
            working_dir: notebook_dir,
            environment,
        };

        self.engine.execute(request).await
    }
}
