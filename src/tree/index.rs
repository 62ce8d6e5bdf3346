//! Path lookups over a flat node list.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::identity::NodePath;
use crate::tree::node::SlicerNode;

/// Path → position and parent → children maps for the member nodes of a
/// list. Built once per pass; the list's structure does not change within a
/// session.
#[derive(Debug, Default)]
pub struct TreeIndex {
    by_path: HashMap<NodePath, usize>,
    children: HashMap<NodePath, Vec<usize>>,
}

impl TreeIndex {
    pub fn new(nodes: &[SlicerNode]) -> Self {
        let mut index = Self::default();
        for (i, node) in nodes.iter().enumerate() {
            if !node.is_member() {
                continue;
            }
            match index.by_path.entry(node.path.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(first) => {
                    tracing::warn!(
                        path = %node.path,
                        first = *first.get(),
                        duplicate = i,
                        "Distinct members format to the same path; lookups resolve to the first"
                    );
                }
            }
            index
                .children
                .entry(node.parent_path.clone())
                .or_default()
                .push(i);
        }
        index
    }

    pub fn get(&self, path: &NodePath) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Direct children (after ragged re-parenting), in list order.
    pub fn children(&self, path: &NodePath) -> &[usize] {
        self.children.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All descendants, depth-first.
    pub fn descendants(&self, nodes: &[SlicerNode], path: &NodePath) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children(path).iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.children(&nodes[i].path).iter().rev().copied());
        }
        out
    }

    /// Ancestors from the immediate parent up to the root-level member.
    pub fn ancestors(&self, nodes: &[SlicerNode], index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = &nodes[index].parent_path;
        while let Some(parent) = self.get(current) {
            if out.contains(&parent) {
                break;
            }
            out.push(parent);
            current = &nodes[parent].parent_path;
        }
        out
    }
}
