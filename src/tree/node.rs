//! Slicer nodes and the path context used while building them.

use serde::{Deserialize, Serialize};

use crate::identity::{self, NodePath};
use crate::matrix::IdentityToken;
use crate::value::PrimitiveValue;

/// Whether a node is a real hierarchy member or the synthetic "select all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SelectAll,
    Member,
}

/// One `(column, formatted value)` pair shown in a node's tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipItem {
    pub display_name: String,
    pub value: String,
}

/// A node of the flattened slicer tree.
///
/// `path` is the node's identity; `label` and `tooltip` are display only.
/// `value` holds one typed value per level from the root down to this node
/// and is what filter tuples are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlicerNode {
    pub kind: NodeKind,
    /// Encoded `path` (new identifier format).
    pub id: String,
    pub path: NodePath,
    pub parent_path: NodePath,
    /// 0-based depth; root-level members are level 0.
    pub level: usize,
    pub value: Vec<PrimitiveValue>,
    pub label: String,
    pub tooltip: Vec<TooltipItem>,
    pub is_leaf: bool,
    pub is_ragged: bool,
    pub selected: bool,
    pub partial_selected: bool,
    pub is_expand: bool,
    pub is_hidden: bool,
    /// Pre-order position in the full tree.
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityToken>,
}

impl SlicerNode {
    /// The synthetic "select all" node.
    pub fn select_all(label: &str) -> Self {
        let path = NodePath::select_all();
        Self {
            kind: NodeKind::SelectAll,
            id: identity::encode(&path),
            path,
            parent_path: NodePath::root(),
            level: 0,
            value: Vec::new(),
            label: label.to_string(),
            tooltip: Vec::new(),
            is_leaf: false,
            is_ragged: false,
            selected: false,
            partial_selected: false,
            is_expand: false,
            is_hidden: false,
            order: 0,
            identity: None,
        }
    }

    pub fn is_member(&self) -> bool {
        self.kind == NodeKind::Member
    }

    pub fn is_select_all(&self) -> bool {
        self.kind == NodeKind::SelectAll
    }

    /// Selected with every descendant selected.
    pub fn is_fully_selected(&self) -> bool {
        self.selected && !self.partial_selected
    }

    pub fn set_selection(&mut self, selected: bool, partial: bool) {
        self.selected = selected;
        self.partial_selected = selected && partial;
    }
}

// ============================================================================
// PATH CONTEXT
// ============================================================================

/// Everything a node inherits from its ancestors, extended one level at a
/// time during descent.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    pub path: NodePath,
    pub values: Vec<PrimitiveValue>,
    pub tooltip: Vec<TooltipItem>,
}

impl PathContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// Context for a child carrying `segment`/`value` at the next level.
    pub fn extend(&self, segment: String, value: PrimitiveValue, tooltip: TooltipItem) -> Self {
        let mut values = self.values.clone();
        values.push(value);
        let mut items = self.tooltip.clone();
        items.push(tooltip);
        Self {
            path: self.path.child(segment),
            values,
            tooltip: items,
        }
    }

    /// Raw value of the level directly above the node being built.
    pub fn parent_value(&self) -> Option<&PrimitiveValue> {
        self.values.last()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
