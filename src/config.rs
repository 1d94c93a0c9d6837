// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Processor configuration
//!
//! Loaded from `.nbflow.yaml` when present. Command-line flags and
//! environment variables override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::NbflowError;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".nbflow.yaml";

/// Local processor configuration from .nbflow.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Base directory for relative notebook paths (default: current directory)
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Parent of the run workspaces (default: system temp directory)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Directory under the workspace root that groups all runs
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Environment forced when a notebook's own one cannot be found
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Execution engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_namespace() -> String {
    "nbflow".to_string()
}

fn default_environment() -> String {
    "python3".to_string()
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            workspace_root: None,
            namespace: default_namespace(),
            default_environment: default_environment(),
            engine: EngineConfig::default(),
        }
    }
}

/// Execution engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable, looked up on the PATH
    #[serde(default = "default_engine_command")]
    pub command: String,

    /// Extra arguments placed before the notebook arguments
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_engine_command() -> String {
    "papermill".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, NbflowError> {
        let content = std::fs::read_to_string(path).map_err(|e| NbflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, NbflowError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| NbflowError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.nbflow.yaml` from a directory, or defaults when it is absent
    pub fn discover(dir: &Path) -> Result<Self, NbflowError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), NbflowError> {
        if self.namespace.trim().is_empty() || self.namespace.contains(&['/', '\\'][..]) {
            return Err(NbflowError::Config {
                message: format!("namespace '{}' must be a single directory name", self.namespace),
            });
        }

        if self.default_environment.trim().is_empty() {
            return Err(NbflowError::Config {
                message: "default_environment must not be empty".into(),
            });
        }

        if self.engine.command.trim().is_empty() {
            return Err(NbflowError::Config {
                message: "engine.command must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Root directory for notebook paths
    pub fn root_dir(&self) -> PathBuf {
        self.root_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Parent directory of all run workspaces: `<workspace root>/<namespace>`
    pub fn workspace_base(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.namespace)
    }
}
