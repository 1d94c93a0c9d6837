// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use std::path::Path;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest installing a missing execution engine
    pub fn install_engine(command: &str) -> Self {
        match command {
            "papermill" => Self {
                action: "Install papermill".into(),
                steps: vec![
                    "papermill executes each notebook of the pipeline".into(),
                    "It needs a Jupyter kernel to run notebooks against".into(),
                ],
                commands: vec![
                    "# Using pip:".into(),
                    "pip install papermill ipykernel".into(),
                    "".into(),
                    "# Using conda:".into(),
                    "conda install -c conda-forge papermill ipykernel".into(),
                ],
            },
            _ => Self {
                action: format!("Install {}", command),
                steps: vec![format!("Install {} and ensure it's in your PATH", command)],
                commands: vec![],
            },
        }
    }

    /// Suggest fixing a dependency cycle
    pub fn fix_cycle(operations: &[String]) -> Self {
        Self {
            action: "Remove the dependency cycle".into(),
            steps: vec![
                format!("Detected cycle: {}", operations.join(" → ")),
                "Review the parent operations of each operation on the cycle".into(),
                "Pipelines must form a directed acyclic graph (DAG)".into(),
            ],
            commands: vec![
                "# Visualize your pipeline:".into(),
                "nbflow order <pipeline> --format mermaid".into(),
            ],
        }
    }

    /// Suggest fixing a parent id that does not exist
    pub fn fix_broken_reference(operation: &str, parent: &str) -> Self {
        Self {
            action: format!("Fix the parents of operation '{}'", operation),
            steps: vec![
                format!("'{}' lists '{}' as a parent, but no such operation exists", operation, parent),
                "Either add the missing operation or remove the reference".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing a notebook path that does not resolve to a file
    pub fn fix_missing_document(path: &Path) -> Self {
        Self {
            action: "Point the operation at an existing notebook".into(),
            steps: vec![
                format!("Nothing exists at {}", path.display()),
                "Relative filenames are resolved against the root directory".into(),
                "Use --root-dir or NBFLOW_ROOT_DIR to change it".into(),
            ],
            commands: vec![],
        }
    }

    /// Point at the captured output of a failed notebook
    pub fn inspect_workspace(document: &Path, workspace: &Path) -> Self {
        let name = document
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            action: format!("Inspect the captured output of {}", name),
            steps: vec![
                "The notebook failed while executing".into(),
                format!("Its output was captured in {}", workspace.display()),
            ],
            commands: vec![
                format!("cat {}", workspace.join(format!("{}.err", name)).display()),
                format!("cat {}", workspace.join(format!("{}.out", name)).display()),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
