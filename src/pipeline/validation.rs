// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Pipeline validation
//!
//! Validates pipeline configuration before execution.

use std::collections::HashSet;

use crate::errors::NbflowError;
use crate::pipeline::{execution_order, Operation, Pipeline};
use crate::processor::PathResolver;

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline configuration
    pub fn validate(pipeline: &Pipeline) -> Result<ValidationResult, NbflowError> {
        let mut result = ValidationResult::new();

        if pipeline.name.trim().is_empty() {
            result.add_error("Pipeline name is empty");
        }

        if pipeline.operations.is_empty() {
            result.add_error("Pipeline has no operations defined");
        }

        // Ordering catches broken references and cycles
        match execution_order(&pipeline.operations) {
            Ok(_) => {}
            Err(e @ NbflowError::CycleDetected { .. })
            | Err(e @ NbflowError::BrokenReference { .. }) => {
                result.add_error(&e.to_string());
            }
            Err(e) => return Err(e),
        }

        for operation in &pipeline.operations {
            Self::validate_operation(operation, &mut result);
        }

        Ok(result)
    }

    /// Validate a single operation
    fn validate_operation(operation: &Operation, result: &mut ValidationResult) {
        if operation.filename.as_os_str().is_empty() {
            result.add_error(&format!("Operation '{}': filename is empty", operation.id));
            return;
        }

        if operation.filename.extension().and_then(|e| e.to_str()) != Some("ipynb") {
            result.add_warning(&format!(
                "Operation '{}': {} does not look like a notebook",
                operation.id,
                operation.filename.display()
            ));
        }

        let mut seen = HashSet::new();
        for parent in &operation.parent_operations {
            if !seen.insert(parent) {
                result.add_warning(&format!(
                    "Operation '{}': parent '{}' is listed more than once",
                    operation.id, parent
                ));
            }
        }
    }

    /// Check that every notebook exists (runtime validation)
    pub fn validate_files(pipeline: &Pipeline, resolver: &dyn PathResolver) -> Vec<String> {
        let mut missing = Vec::new();

        for operation in &pipeline.operations {
            let path = resolver.resolve(&operation.filename);
            if !path.is_file() {
                missing.push(format!(
                    "Operation '{}': notebook not found: {}",
                    operation.id,
                    path.display()
                ));
            }
        }

        missing
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
