// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Run workspaces
//!
//! Each run gets its own directory, `<base>/<pipeline>-<timestamp>`, holding
//! the captured output of every notebook. Workspaces are never removed and
//! act as a ledger of past runs.
//!
//! Timestamps are UTC. Local wall-clock time repeats an hour when daylight
//! saving ends, which would hand two runs the same directory.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::errors::NbflowError;

/// Timestamp format of run names, seconds resolution, UTC
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Directory dedicated to a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkspace {
    run_name: String,
    path: PathBuf,
}

impl RunWorkspace {
    /// Run name, `<pipeline>-<timestamp>`
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capture file for a notebook's standard output
    pub fn stdout_path(&self, notebook_name: &str) -> PathBuf {
        self.path.join(format!("{}.out", notebook_name))
    }

    /// Capture file for a notebook's standard error
    pub fn stderr_path(&self, notebook_name: &str) -> PathBuf {
        self.path.join(format!("{}.err", notebook_name))
    }
}

/// Allocates run workspaces below a base directory
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    base: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at `base`, usually `<tmp>/<namespace>`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Name of a run of `pipeline_name` started at `started`
    pub fn run_name(pipeline_name: &str, started: DateTime<Utc>) -> String {
        format!("{}-{}", pipeline_name, started.format(RUN_TIMESTAMP_FORMAT))
    }

    /// Allocate the workspace for a run starting now
    pub fn allocate(&self, pipeline_name: &str) -> Result<RunWorkspace, NbflowError> {
        self.create(&Self::run_name(pipeline_name, Utc::now()))
    }

    /// Create the workspace for `run_name`; an existing directory is reused
    pub fn create(&self, run_name: &str) -> Result<RunWorkspace, NbflowError> {
        let path = self.base.join(run_name);

        create_private_dir(&path).map_err(|e| NbflowError::WorkspaceCreation {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Ok(RunWorkspace {
            run_name: run_name.to_string(),
            path,
        })
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::DirBuilder::new().recursive(true).create(path)
}
