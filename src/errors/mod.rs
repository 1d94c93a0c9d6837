// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Error types
//!
//! Every failure aborts the whole run, so each error carries enough context
//! (operation, document path, run workspace) to diagnose it after the
//! process has exited.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::executors::EngineFailure;

/// Result type for nbflow operations
pub type NbflowResult<T> = Result<T, NbflowError>;

/// Main error type for nbflow
#[derive(Error, Debug, Diagnostic)]
pub enum NbflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Operation '{id}' is defined more than once")]
    #[diagnostic(
        code(nbflow::duplicate_operation),
        help("Operation ids must be unique within a pipeline")
    )]
    DuplicateOperation { id: String },

    #[error("Operation '{operation}' depends on unknown operation '{parent}'")]
    #[diagnostic(
        code(nbflow::broken_reference),
        help("Check that '{parent}' is defined in your pipeline")
    )]
    BrokenReference { operation: String, parent: String },

    #[error("Cycle detected: {}", operations.join(" → "))]
    #[diagnostic(
        code(nbflow::cycle_detected),
        help("Review the parent operations to remove the cycle")
    )]
    CycleDetected { operations: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Could not find {path}")]
    #[diagnostic(code(nbflow::document_not_found))]
    DocumentNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error(
        "Internal error executing {path}{}. Details available at {workspace}",
        fallback_note(.default_environment)
    )]
    #[diagnostic(
        code(nbflow::execution_failed),
        help("The .out and .err files in the run workspace hold the captured output")
    )]
    ExecutionFailed {
        path: PathBuf,
        workspace: PathBuf,
        /// Set when the failure happened on the forced default environment
        default_environment: Option<String>,
        #[source]
        cause: EngineFailure,
    },

    #[error("Execution engine '{command}' not found")]
    #[diagnostic(code(nbflow::engine_not_found), help("{suggestion}"))]
    EngineNotFound { command: String, suggestion: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Processor Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{runtime} pipelines do not support {operation}")]
    #[diagnostic(
        code(nbflow::not_supported),
        help("Local execution runs notebooks in place and produces no exportable artifacts")
    )]
    NotSupported { runtime: String, operation: String },

    #[error("Failed to create run workspace '{path}': {error}")]
    #[diagnostic(code(nbflow::workspace_error))]
    WorkspaceCreation { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline / Config Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(nbflow::pipeline_not_found),
        help("Pass the path of a pipeline .yaml or .json file")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Invalid pipeline: {reason}")]
    #[diagnostic(code(nbflow::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(nbflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(nbflow::config_error))]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(nbflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(nbflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(nbflow::json_error))]
    Json { message: String },
}

fn fallback_note(default_environment: &Option<String>) -> String {
    match default_environment {
        Some(env) => format!(" with default environment '{}'", env),
        None => String::new(),
    }
}

impl From<std::io::Error> for NbflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for NbflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for NbflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl NbflowError {
    /// Create an engine not found error with installation suggestion
    pub fn engine_not_found(command: &str) -> Self {
        let suggestion = match command {
            "papermill" => "Install papermill: pip install papermill ipykernel".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", command),
        };

        Self::EngineNotFound {
            command: command.to_string(),
            suggestion,
        }
    }

    /// Create a document not found error
    pub fn document_not_found(path: PathBuf) -> Self {
        Self::DocumentNotFound {
            path,
            help: Some("Relative filenames are resolved against the root directory".into()),
        }
    }

    /// The run workspace this error points at, if any
    pub fn workspace(&self) -> Option<&std::path::Path> {
        match self {
            Self::ExecutionFailed { workspace, .. } => Some(workspace),
            _ => None,
        }
    }

    /// Build the recovery suggestion shown by the CLI, if one applies
    pub fn recovery(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::CycleDetected { operations } => {
                Some(RecoverySuggestion::fix_cycle(operations))
            }
            Self::BrokenReference { operation, parent } => {
                Some(RecoverySuggestion::fix_broken_reference(operation, parent))
            }
            Self::DocumentNotFound { path, .. } => {
                Some(RecoverySuggestion::fix_missing_document(path))
            }
            Self::ExecutionFailed { path, workspace, .. } => {
                Some(RecoverySuggestion::inspect_workspace(path, workspace))
            }
            Self::EngineNotFound { command, .. } => Some(RecoverySuggestion::install_engine(command)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::EngineFailureKind;

    #[test]
    fn test_execution_failed_names_document_and_workspace() {
        let err = NbflowError::ExecutionFailed {
            path: PathBuf::from("/work/a.ipynb"),
            workspace: PathBuf::from("/tmp/nbflow/p-20250101000000"),
            default_environment: None,
            cause: EngineFailure::new(EngineFailureKind::Failed, "exit status 1"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/work/a.ipynb"));
        assert!(msg.contains("Details available at /tmp/nbflow/p-20250101000000"));
        assert!(!msg.contains("default environment"));
    }

    #[test]
    fn test_execution_failed_mentions_forced_environment() {
        let err = NbflowError::ExecutionFailed {
            path: PathBuf::from("a.ipynb"),
            workspace: PathBuf::from("ws"),
            default_environment: Some("python3".into()),
            cause: EngineFailure::new(EngineFailureKind::Failed, "boom"),
        };

        assert!(err.to_string().contains("with default environment 'python3'"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = NbflowError::CycleDetected {
            operations: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected: a → b → a");
    }
}
