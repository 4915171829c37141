//! Flattening of tree-shaped dependency reports
//!
//! Some providers report dependencies as a recursive tree (output chunk →
//! nested inputs) instead of a flat edge list. The flattener walks the tree
//! with a per-traversal visited set so shared subtrees and cycles terminate,
//! and emits [`RawModule`] records the [`GraphBuilder`](crate::GraphBuilder)
//! can consume.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::builder::{RawDependency, RawModule};

/// One node of a tree-shaped provider report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Raw identifier
    pub name: String,
    /// Source size in bytes
    pub size: u64,
    /// Nested inputs
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }
}

/// Flatten tree-shaped reports into per-module edge records
///
/// Each tree node becomes one [`RawModule`] whose dependencies are its direct
/// children. A node already visited in this traversal still contributes its
/// edge but is not descended into again.
pub fn flatten_tree(roots: &[TreeNode]) -> Vec<RawModule> {
    let mut visited = HashSet::new();
    let mut flat = Vec::new();

    for root in roots {
        walk(root, &mut visited, &mut flat);
    }

    flat
}

fn walk(node: &TreeNode, visited: &mut HashSet<String>, flat: &mut Vec<RawModule>) {
    if !visited.insert(node.name.clone()) {
        return;
    }

    flat.push(RawModule {
        identifier: node.name.clone(),
        size: node.size,
        chunks: Vec::new(),
        dependencies: node
            .children
            .iter()
            .map(|child| RawDependency::Resolved {
                identifier: child.name.clone(),
            })
            .collect(),
    });

    for child in &node.children {
        walk(child, visited, flat);
    }
}
