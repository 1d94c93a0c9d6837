// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Pipeline definitions and ordering
//!
//! This module defines the operation graph of a pipeline, the sequencer
//! that linearizes it, and structural validation.

mod dag;
mod definition;
mod sequencer;
mod validation;

pub use dag::DependencyGraph;
pub use definition::*;
pub use sequencer::{execution_order, ExecutionOrder};
pub use validation::{PipelineValidator, ValidationResult};
