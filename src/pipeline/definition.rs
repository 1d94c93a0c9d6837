// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Pipeline definition structures
//!
//! A pipeline is a named, insertion-ordered map of operations. Operation
//! order matters: it decides the relative order of independent branches
//! in the execution order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::NbflowError;

/// A single unit of work: one notebook to execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation id (must be unique within pipeline)
    pub id: String,

    /// Human readable name
    pub name: String,

    /// Notebook to execute, relative to the processor root directory
    pub filename: PathBuf,

    /// Ids of the operations that must run before this one
    #[serde(default)]
    pub parent_operations: Vec<String>,
}

impl Operation {
    /// Create an operation
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        filename: impl Into<PathBuf>,
        parent_operations: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filename: filename.into(),
            parent_operations,
        }
    }

    /// Whether this operation has no parents
    pub fn is_root(&self) -> bool {
        self.parent_operations.is_empty()
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Operation {}

/// Insertion-ordered mapping from operation id to operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct OperationMap {
    operations: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl OperationMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an operation under its own id
    pub fn insert(&mut self, operation: Operation) -> Result<(), NbflowError> {
        if self.index.contains_key(&operation.id) {
            return Err(NbflowError::DuplicateOperation { id: operation.id });
        }

        self.index.insert(operation.id.clone(), self.operations.len());
        self.operations.push(operation);
        Ok(())
    }

    /// Look up an operation by id
    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.index.get(id).map(|&idx| &self.operations[idx])
    }

    /// Iterate operations in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl TryFrom<Vec<Operation>> for OperationMap {
    type Error = NbflowError;

    fn try_from(operations: Vec<Operation>) -> Result<Self, Self::Error> {
        let mut map = Self::new();
        for operation in operations {
            map.insert(operation)?;
        }
        Ok(map)
    }
}

impl From<OperationMap> for Vec<Operation> {
    fn from(map: OperationMap) -> Self {
        map.operations
    }
}

impl<'a> IntoIterator for &'a OperationMap {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name, used to name run workspaces
    pub name: String,

    /// Operations in declaration order
    #[serde(default)]
    pub operations: OperationMap,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: OperationMap::new(),
        }
    }

    /// Load a pipeline from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self, NbflowError> {
        if !path.exists() {
            return Err(NbflowError::PipelineNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| NbflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse pipeline from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, NbflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse pipeline from JSON string
    pub fn from_json(json: &str) -> Result<Self, NbflowError> {
        serde_json::from_str(json).map_err(Into::into)
    }
}
