//! Matrix-to-tree builder.
//!
//! Walks the host matrix depth-first and emits a flat, pre-order node list:
//! every parent is immediately followed by its subtree.
//!
//! ```text
//! MatrixResult ──► TreeBuilder ──► BuiltTree { nodes, full_tree }
//!                      │
//!                      ├── type values from column metadata
//!                      ├── flag ragged members (hide-members policy)
//!                      └── prune ragged members, re-parent their subtrees
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::{HideMembers, SlicerSettings};
use crate::error::{SlicerError, SlicerResult};
use crate::format::format_value;
use crate::identity::{self, NodePath};
use crate::matrix::{MatrixNode, MatrixResult};
use crate::tree::node::{NodeKind, PathContext, SlicerNode, TooltipItem};
use crate::value::{ColumnMetadata, PrimitiveValue};

/// Output of a build.
#[derive(Debug, Clone, Default)]
pub struct BuiltTree {
    /// Working list: ragged members removed, leaves recomputed.
    pub nodes: Vec<SlicerNode>,
    /// Every member as built, ragged ones included.
    pub full_tree: Vec<SlicerNode>,
}

impl BuiltTree {
    pub fn has_ragged(&self) -> bool {
        self.full_tree.iter().any(|n| n.is_ragged)
    }
}

/// Builds slicer nodes from a host matrix.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    settings: &'a SlicerSettings,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(settings: &'a SlicerSettings) -> Self {
        Self { settings }
    }

    /// Build the node lists.
    ///
    /// # Errors
    /// `EmptyDataset` when the matrix has no levels or rows;
    /// `UnsupportedDataType` when a level value is not a primitive.
    pub fn build(&self, matrix: &MatrixResult) -> SlicerResult<BuiltTree> {
        if matrix.is_empty() {
            return Err(SlicerError::EmptyDataset);
        }

        let mut nodes = Vec::new();
        if self.settings.shows_select_all() {
            nodes.push(SlicerNode::select_all(
                &self.settings.selection.select_all_label,
            ));
        }

        let root = PathContext::root();
        for row in &matrix.rows {
            self.visit(row, 0, &root, &matrix.levels, &mut nodes)?;
        }

        let max_nodes = self.settings.hierarchy.max_nodes;
        if nodes.len() > max_nodes {
            tracing::warn!(
                node_count = nodes.len(),
                max_nodes,
                "Slicer tree exceeds the configured node cap"
            );
        }

        let full_tree = nodes;
        let nodes = prune_ragged(&full_tree);

        tracing::debug!(
            full = full_tree.len(),
            working = nodes.len(),
            levels = matrix.levels.len(),
            "Built slicer tree"
        );

        Ok(BuiltTree { nodes, full_tree })
    }

    fn visit(
        &self,
        node: &MatrixNode,
        level: usize,
        context: &PathContext,
        levels: &[ColumnMetadata],
        out: &mut Vec<SlicerNode>,
    ) -> SlicerResult<()> {
        let column = &levels[level];
        let raw = PrimitiveValue::from_host(&node.value, &column.column_type, level)?;
        let formatted = format_value(&raw, column.format.as_deref());

        let is_ragged = match self.settings.hierarchy.hide_members {
            HideMembers::Never => false,
            HideMembers::Empty => raw.is_empty(),
            HideMembers::ParentName => level > 0 && context.parent_value() == Some(&raw),
        };

        let label = if raw.is_empty() {
            self.settings.hierarchy.empty_leaf_label.clone()
        } else {
            formatted.clone()
        };

        let child_context = context.extend(
            formatted,
            raw,
            TooltipItem {
                display_name: column.display_name.clone(),
                value: label.clone(),
            },
        );

        let has_deeper_level = level + 1 < levels.len();
        if !node.children.is_empty() && !has_deeper_level {
            tracing::debug!(
                level,
                "Matrix node has children below the last bound level; ignoring them"
            );
        }
        let is_leaf = node.children.is_empty() || !has_deeper_level;

        out.push(SlicerNode {
            kind: NodeKind::Member,
            id: identity::encode(&child_context.path),
            path: child_context.path.clone(),
            parent_path: context.path.clone(),
            level,
            value: child_context.values.clone(),
            label,
            tooltip: child_context.tooltip.clone(),
            is_leaf,
            is_ragged,
            selected: false,
            partial_selected: false,
            is_expand: false,
            is_hidden: false,
            order: out.len(),
            identity: node.identity.clone(),
        });

        if has_deeper_level {
            for child in &node.children {
                self.visit(child, level + 1, &child_context, levels, out)?;
            }
        }
        Ok(())
    }
}

/// Drop ragged members, attach their surviving descendants to the nearest
/// non-ragged ancestor, and recompute leaves.
fn prune_ragged(full_tree: &[SlicerNode]) -> Vec<SlicerNode> {
    if !full_tree.iter().any(|n| n.is_ragged) {
        return full_tree.to_vec();
    }

    // Pre-order guarantees a ragged parent is mapped before its children.
    let mut replacement: HashMap<NodePath, NodePath> = HashMap::new();
    let mut kept = Vec::with_capacity(full_tree.len());
    for node in full_tree {
        let mut node = node.clone();
        if let Some(parent) = replacement.get(&node.parent_path) {
            node.parent_path = parent.clone();
        }
        if node.is_ragged {
            replacement.insert(node.path.clone(), node.parent_path.clone());
        } else {
            kept.push(node);
        }
    }

    let parents: HashSet<NodePath> = kept
        .iter()
        .filter(|n| n.is_member())
        .map(|n| n.parent_path.clone())
        .collect();
    for node in kept.iter_mut().filter(|n| n.is_member()) {
        node.is_leaf = !parents.contains(&node.path);
    }
    kept
}
