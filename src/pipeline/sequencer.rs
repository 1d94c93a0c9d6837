// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Execution order for pipeline operations
//!
//! Operations are walked in declaration order. An operation with parents is
//! placed only after all of its parents, which are visited depth first in
//! the order they are listed. Each operation is placed exactly once, on
//! first encounter, so sibling branches keep their declaration order.
//!
//! The walk uses an explicit stack, so arbitrarily deep chains are fine.
//! An operation met again while it is still on the stack closes a cycle
//! and is reported as an error.

use std::collections::HashMap;

use crate::errors::NbflowError;
use crate::pipeline::{Operation, OperationMap};

/// A valid linearization of a pipeline's operations
#[derive(Debug, Clone)]
pub struct ExecutionOrder<'a>(Vec<&'a Operation>);

impl<'a> ExecutionOrder<'a> {
    /// Operations in execution order
    pub fn iter(&self) -> impl Iterator<Item = &'a Operation> + '_ {
        self.0.iter().copied()
    }

    /// Operation ids in execution order
    pub fn ids(&self) -> Vec<&'a str> {
        self.0.iter().map(|op| op.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for ExecutionOrder<'a> {
    type Item = &'a Operation;
    type IntoIter = std::vec::IntoIter<&'a Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Placed,
}

struct Frame<'a> {
    operation: &'a Operation,
    next_parent: usize,
}

/// Compute the execution order of a set of operations
pub fn execution_order(operations: &OperationMap) -> Result<ExecutionOrder<'_>, NbflowError> {
    let mut order = Vec::with_capacity(operations.len());
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(operations.len());
    let mut stack: Vec<Frame<'_>> = Vec::new();

    for operation in operations {
        if marks.contains_key(operation.id.as_str()) {
            continue;
        }

        marks.insert(&operation.id, Mark::OnStack);
        stack.push(Frame {
            operation,
            next_parent: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let current: &Operation = frame.operation;

            let Some(parent_id) = current.parent_operations.get(frame.next_parent) else {
                // all parents placed
                stack.pop();
                marks.insert(&current.id, Mark::Placed);
                order.push(current);
                continue;
            };
            frame.next_parent += 1;

            let parent = operations
                .get(parent_id)
                .ok_or_else(|| NbflowError::BrokenReference {
                    operation: current.id.clone(),
                    parent: parent_id.clone(),
                })?;

            match marks.get(parent.id.as_str()) {
                Some(Mark::Placed) => {}
                Some(Mark::OnStack) => {
                    return Err(NbflowError::CycleDetected {
                        operations: cycle_path(&stack, &parent.id),
                    });
                }
                None => {
                    marks.insert(&parent.id, Mark::OnStack);
                    stack.push(Frame {
                        operation: parent,
                        next_parent: 0,
                    });
                }
            }
        }
    }

    Ok(ExecutionOrder(order))
}

/// Ids along the cycle, starting and ending at `closing`
///
/// The stack runs from children to parents, so the path is reversed to read
/// in dependency direction.
fn cycle_path(stack: &[Frame<'_>], closing: &str) -> Vec<String> {
    let start = stack
        .iter()
        .position(|frame| frame.operation.id == closing)
        .unwrap_or(0);

    let mut path: Vec<String> = stack[start..]
        .iter()
        .rev()
        .map(|frame| frame.operation.id.clone())
        .collect();
    path.insert(0, closing.to_string());
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_operations(ops: Vec<(&str, Vec<&str>)>) -> OperationMap {
        let mut map = OperationMap::new();
        for (id, parents) in ops {
            map.insert(Operation::new(
                id,
                id,
                format!("{}.ipynb", id),
                parents.into_iter().map(String::from).collect(),
            ))
            .unwrap();
        }
        map
    }

    fn assert_valid_order(operations: &OperationMap, order: &ExecutionOrder<'_>) {
        let ids = order.ids();
        assert_eq!(ids.len(), operations.len());

        for op in operations {
            let pos = ids.iter().position(|id| *id == op.id).unwrap();
            assert_eq!(ids.iter().filter(|id| **id == op.id).count(), 1);
            for parent in &op.parent_operations {
                let parent_pos = ids.iter().position(|id| *id == parent.as_str()).unwrap();
                assert!(parent_pos < pos, "{} must run before {}", parent, op.id);
            }
        }
    }

    #[test]
    fn test_complex_pipeline_order() {
        let operations = make_operations(vec![
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["b"]),
            ("d", vec!["a"]),
            ("e", vec!["c", "d"]),
            ("f", vec![]),
            ("x", vec!["a", "c", "e"]),
            ("y", vec!["b", "d", "f"]),
            ("g", vec!["x", "y"]),
            ("h", vec!["x", "y"]),
        ]);

        let order = execution_order(&operations).unwrap();

        assert_eq!(order.ids(), vec!["a", "b", "c", "d", "e", "f", "x", "y", "g", "h"]);
    }

    #[test]
    fn test_independent_chains_keep_declaration_order() {
        let operations = make_operations(vec![
            ("r1", vec![]),
            ("r2", vec![]),
            ("c1", vec!["r1"]),
            ("c2", vec!["r2"]),
        ]);

        let order = execution_order(&operations).unwrap();
        assert_eq!(order.ids(), vec!["r1", "r2", "c1", "c2"]);
    }

    #[test]
    fn test_children_declared_first_pull_in_parents() {
        let operations = make_operations(vec![
            ("c2", vec!["r2"]),
            ("c1", vec!["r1"]),
            ("r1", vec![]),
            ("r2", vec![]),
        ]);

        let order = execution_order(&operations).unwrap();
        assert_eq!(order.ids(), vec!["r2", "c2", "r1", "c1"]);
    }

    #[test]
    fn test_parents_visited_in_listed_order() {
        let operations = make_operations(vec![
            ("d", vec!["c", "b"]),
            ("c", vec!["a"]),
            ("b", vec!["a"]),
            ("a", vec![]),
        ]);

        let order = execution_order(&operations).unwrap();
        assert_eq!(order.ids(), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_shared_parent_placed_once() {
        let operations = make_operations(vec![
            ("left", vec!["root"]),
            ("right", vec!["root"]),
            ("root", vec![]),
        ]);

        let order = execution_order(&operations).unwrap();
        assert_eq!(order.ids(), vec!["root", "left", "right"]);
    }

    #[test]
    fn test_empty_pipeline() {
        let operations = OperationMap::new();
        assert!(execution_order(&operations).unwrap().is_empty());
    }

    #[test]
    fn test_broken_reference() {
        let operations = make_operations(vec![("a", vec![]), ("b", vec!["a", "ghost"])]);

        let result = execution_order(&operations);
        assert!(matches!(
            result,
            Err(NbflowError::BrokenReference { operation, parent })
                if operation == "b" && parent == "ghost"
        ));
    }

    #[test]
    fn test_two_node_cycle() {
        let operations = make_operations(vec![("a", vec!["b"]), ("b", vec!["a"])]);

        match execution_order(&operations) {
            Err(NbflowError::CycleDetected { operations }) => {
                assert_eq!(operations, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_cycle() {
        let operations = make_operations(vec![("a", vec!["a"])]);

        match execution_order(&operations) {
            Err(NbflowError::CycleDetected { operations }) => {
                assert_eq!(operations, vec!["a", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_below_valid_prefix() {
        let operations = make_operations(vec![
            ("root", vec![]),
            ("x", vec!["root", "z"]),
            ("y", vec!["x"]),
            ("z", vec!["y"]),
        ]);

        match execution_order(&operations) {
            Err(NbflowError::CycleDetected { operations }) => {
                assert_eq!(operations, vec!["x", "y", "z", "x"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 50_000;
        let mut map = OperationMap::new();
        // declared leaf first so the walk has to descend the whole chain
        for i in (0..depth).rev() {
            let parents = if i == 0 { vec![] } else { vec![format!("op{}", i - 1)] };
            map.insert(Operation::new(format!("op{}", i), "op", "op.ipynb", parents))
                .unwrap();
        }

        let order = execution_order(&map).unwrap();
        assert_eq!(order.len(), depth);
        assert_eq!(order.ids()[0], "op0");
        assert_eq!(order.ids()[depth - 1], format!("op{}", depth - 1));
    }

    #[test]
    fn test_generated_dags_are_valid() {
        // small LCG so the graphs are reproducible
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as usize) % bound.max(1)
        };

        for size in [1usize, 2, 5, 12, 40] {
            for _ in 0..10 {
                // parents always have a lower number, so the graph is acyclic,
                // then the declaration order is shuffled
                let mut ops: Vec<(String, Vec<String>)> = (0..size)
                    .map(|i| {
                        let parents = (0..next(4))
                            .filter(|_| i > 0)
                            .map(|_| format!("n{}", next(i)))
                            .collect::<std::collections::BTreeSet<_>>()
                            .into_iter()
                            .collect();
                        (format!("n{}", i), parents)
                    })
                    .collect();
                for i in (1..ops.len()).rev() {
                    let j = next(i + 1);
                    ops.swap(i, j);
                }

                let mut map = OperationMap::new();
                for (id, parents) in ops {
                    map.insert(Operation::new(id.clone(), id, "n.ipynb", parents)).unwrap();
                }

                let order = execution_order(&map).unwrap();
                assert_valid_order(&map, &order);
            }
        }
    }
}
