// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Dependency graph of a pipeline
//!
//! Used for inspection and rendering. Execution order comes from the
//! sequencer, which preserves declaration order between branches.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::errors::NbflowError;
use crate::pipeline::{execution_order, Pipeline};

/// Dependency graph of operations, edges point from parent to child
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
    /// Node ids in declaration order, for stable rendering
    declared: Vec<String>,
}

impl DependencyGraph {
    /// Build the graph of a pipeline
    pub fn build(pipeline: &Pipeline) -> Result<Self, NbflowError> {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();
        let mut declared = Vec::with_capacity(pipeline.operations.len());

        for operation in &pipeline.operations {
            let node = graph.add_node(operation.id.clone());
            id_to_index.insert(operation.id.clone(), node);
            declared.push(operation.id.clone());
        }

        for operation in &pipeline.operations {
            let node = id_to_index[&operation.id];

            for parent in &operation.parent_operations {
                let parent_node =
                    id_to_index
                        .get(parent)
                        .ok_or_else(|| NbflowError::BrokenReference {
                            operation: operation.id.clone(),
                            parent: parent.clone(),
                        })?;

                if !graph.contains_edge(*parent_node, node) {
                    graph.add_edge(*parent_node, node, ());
                }
            }
        }

        Ok(Self {
            graph,
            id_to_index,
            declared,
        })
    }

    /// Generate Mermaid diagram of the graph
    ///
    /// Nodes are keyed `n<index>` with the operation id as a quoted label,
    /// so ids with spaces, dashes or brackets stay valid.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for id in &self.declared {
            let node = self.id_to_index[id];
            out.push_str(&format!(
                "    n{}[\"{}\"]\n",
                node.index(),
                id.replace('"', "#quot;")
            ));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    n{} --> n{}\n", from.index(), to.index()));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.graph[from], self.graph[to]
            ));
        }

        // isolated nodes
        for id in &self.declared {
            let node = self.id_to_index[id];
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", id));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of the execution order
    pub fn to_text(&self, pipeline: &Pipeline) -> Result<String, NbflowError> {
        let order = execution_order(&pipeline.operations)?;
        let mut out = String::new();

        for (i, operation) in order.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} ({})",
                i + 1,
                operation.name,
                operation.filename.display()
            ));

            if !operation.parent_operations.is_empty() {
                out.push_str(&format!(
                    " [depends: {}]",
                    operation.parent_operations.join(", ")
                ));
            }

            out.push('\n');
        }

        Ok(out)
    }

    fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(move |edge| self.graph.edge_endpoints(edge))
    }
}
