// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Processor responses

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::NbflowError;
use crate::processor::DispatchReport;

/// Per-operation entry of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub id: String,
    pub name: String,
    /// Resolved notebook path
    pub path: PathBuf,
    pub duration_ms: u64,
    #[serde(default)]
    pub used_default_environment: bool,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl OperationReport {
    pub fn from_dispatch(id: &str, name: &str, report: DispatchReport) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            path: report.path,
            duration_ms: report.duration.as_millis() as u64,
            used_default_environment: report.used_default_environment,
            stdout: report.stdout,
            stderr: report.stderr,
        }
    }
}

/// Result of a completed run; a failed run is an `NbflowError` instead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorResponse {
    pub message: String,
    /// Run workspace holding the captured output
    pub workspace: PathBuf,
    /// Operations in the order they ran
    #[serde(default)]
    pub operations: Vec<OperationReport>,
}

impl ProcessorResponse {
    /// Serialize to pretty JSON for callers
    pub fn to_json(&self) -> Result<String, NbflowError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}
