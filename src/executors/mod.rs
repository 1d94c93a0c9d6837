// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Execution engines
//!
//! An execution engine runs a single notebook. This module provides the
//! engine trait, the failure type it reports, and the papermill engine.

mod papermill;

pub use papermill::PapermillEngine;

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use crate::errors::NbflowError;

/// Everything an engine needs to run one notebook
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// Notebook to execute
    pub input_path: &'a Path,
    /// Where the executed notebook is written
    pub output_path: &'a Path,
    /// Sink for the notebook's standard output
    pub stdout: &'a File,
    /// Sink for the notebook's standard error
    pub stderr: &'a File,
    /// Path of the `stdout` sink, for engines that open it themselves
    pub stdout_path: &'a Path,
    /// Path of the `stderr` sink
    pub stderr_path: &'a Path,
    /// Working directory of the kernel
    pub working_dir: &'a Path,
    /// Environment override; `None` uses the one embedded in the notebook
    pub environment: Option<&'a str>,
}

/// Why an engine run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailureKind {
    /// The environment the notebook asked for does not exist
    EnvironmentNotFound,
    /// Anything else
    Failed,
}

/// Failure reported by an execution engine
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct EngineFailure {
    pub kind: EngineFailureKind,
    pub message: String,
}

impl EngineFailure {
    pub fn new(kind: EngineFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn environment_not_found(message: impl Into<String>) -> Self {
        Self::new(EngineFailureKind::EnvironmentNotFound, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(EngineFailureKind::Failed, message)
    }

    pub fn is_environment_not_found(&self) -> bool {
        self.kind == EngineFailureKind::EnvironmentNotFound
    }
}

/// Trait for notebook execution engines
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Engine name, for logs
    fn name(&self) -> &str;

    /// Execute a notebook
    ///
    /// The notebook's output streams go to the sinks of the request, after
    /// anything earlier attempts left there. Returns once the notebook has
    /// finished; there is no timeout.
    async fn execute(&self, request: EngineRequest<'_>) -> Result<(), EngineFailure>;

    /// Check if the engine can be started
    async fn check_available(&self) -> bool;

    /// Get engine version
    async fn version(&self) -> Result<String, NbflowError>;
}
