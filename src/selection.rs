//! Selection state engine.
//!
//! Passes over a flat, pre-order node list:
//!
//! ```text
//! apply_filter ──► propagate_partial_selection ──► rollup_select_all
//!                                                       │
//!        (single-select) enforce_single_select ◄────────┘
//!
//! visibility:  apply_expand_visibility   (expanded-paths list)
//!              apply_search_visibility   (label predicate)
//! ```
//!
//! Leaf selection is the source of truth; every non-leaf state is derived
//! from its children, so each pass can be re-run without changing the
//! result.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::config::{SearchMode, SlicerSettings};
use crate::error::{SlicerError, SlicerResult};
use crate::identity::NodePath;
use crate::tree::{SlicerNode, TreeIndex};

// ============================================================================
// APPLY FILTER
// ============================================================================

/// Mark nodes selected from restored paths.
///
/// With no paths every member takes the configured default. Otherwise the
/// depth is the length of the first path and a node is selected when its
/// path truncated to that depth is one of the paths. A leaf shorter than
/// the depth is selected when any path runs through it (its pruned or
/// missing children were padded out on serialization).
pub fn apply_filter(
    nodes: &mut [SlicerNode],
    index: &TreeIndex,
    selected: &[NodePath],
    settings: &SlicerSettings,
) {
    match selected.first() {
        None => {
            let default = settings.selection.default_selected;
            for node in nodes.iter_mut().filter(|n| n.is_member()) {
                node.set_selection(default, false);
            }
        }
        Some(first) => {
            let depth = first.len();
            let wanted: HashSet<&NodePath> = selected.iter().collect();
            let through: HashSet<NodePath> = selected
                .iter()
                .flat_map(|p| (1..p.len()).map(move |k| p.truncated(k)))
                .collect();
            for node in nodes.iter_mut().filter(|n| n.is_member()) {
                let hit = if node.path.len() >= depth {
                    wanted.contains(&node.path.truncated(depth))
                } else {
                    node.is_leaf && through.contains(&node.path)
                };
                node.set_selection(hit, false);
            }
            tracing::debug!(depth, paths = selected.len(), "Applied restored selection");
        }
    }

    propagate_partial_selection(nodes, index);
    rollup_select_all(nodes);
    if settings.selection.single_select {
        enforce_single_select(nodes, index);
    }
}

// ============================================================================
// PROPAGATION
// ============================================================================

/// Derive every parent's `selected`/`partial_selected` from its children,
/// deepest level first.
///
/// A parent with no selected child is unselected. A parent whose children
/// are all fully selected is fully selected. Anything in between is
/// partial.
pub fn propagate_partial_selection(nodes: &mut [SlicerNode], index: &TreeIndex) {
    let mut parents: Vec<usize> = (0..nodes.len())
        .filter(|&i| nodes[i].is_member() && !index.children(&nodes[i].path).is_empty())
        .collect();
    parents.sort_by(|&a, &b| nodes[b].level.cmp(&nodes[a].level));

    for i in parents {
        let children = index.children(&nodes[i].path);
        let selected = children.iter().filter(|&&c| nodes[c].selected).count();
        let any_partial = children.iter().any(|&c| nodes[c].partial_selected);
        if selected == 0 {
            nodes[i].set_selection(false, false);
        } else {
            nodes[i].set_selection(true, selected < children.len() || any_partial);
        }
    }
}

/// Select-all is selected when any member is, and partial when some member
/// is not fully selected.
pub fn rollup_select_all(nodes: &mut [SlicerNode]) {
    let any_selected = nodes.iter().any(|n| n.is_member() && n.selected);
    let any_unfinished = nodes
        .iter()
        .any(|n| n.is_member() && !n.is_fully_selected());
    for node in nodes.iter_mut().filter(|n| n.is_select_all()) {
        node.set_selection(any_selected, any_unfinished);
    }
}

/// Carry the working selection onto the full tree, ragged members included.
///
/// Leaves of the full tree that survived pruning copy their working state.
/// Pruned leaves take the full selection of their nearest surviving
/// ancestor. Every parent is then re-derived over the full tree's own
/// links, so each selected branch has a member at every level.
pub fn project_onto_full_tree(
    nodes: &[SlicerNode],
    index: &TreeIndex,
    full_tree: &[SlicerNode],
) -> Vec<SlicerNode> {
    let mut full = full_tree.to_vec();
    let full_index = TreeIndex::new(&full);

    for i in 0..full.len() {
        if !full[i].is_member() || !full_index.children(&full[i].path).is_empty() {
            continue;
        }
        let selected = match index.get(&full[i].path) {
            Some(w) => nodes[w].selected,
            None => nearest_surviving(index, &full[i].path)
                .is_some_and(|w| nodes[w].is_fully_selected()),
        };
        full[i].set_selection(selected, false);
    }

    propagate_partial_selection(&mut full, &full_index);
    full
}

fn nearest_surviving(index: &TreeIndex, path: &NodePath) -> Option<usize> {
    (1..path.len()).rev().find_map(|k| index.get(&path.truncated(k)))
}

// ============================================================================
// TOGGLES
// ============================================================================

/// Set a node and its whole subtree.
pub fn set_subtree(nodes: &mut [SlicerNode], index: &TreeIndex, at: usize, selected: bool) {
    nodes[at].set_selection(selected, false);
    for d in index.descendants(nodes, &nodes[at].path) {
        nodes[d].set_selection(selected, false);
    }
}

/// Set every member.
pub fn set_all(nodes: &mut [SlicerNode], selected: bool) {
    for node in nodes.iter_mut() {
        node.set_selection(selected, false);
    }
}

/// Re-derive parents and select-all after leaf changes.
pub fn recompute(nodes: &mut [SlicerNode], index: &TreeIndex) {
    propagate_partial_selection(nodes, index);
    rollup_select_all(nodes);
}

/// Handle a click on `path`. Returns false when the path is unknown.
///
/// Multi-select toggles the subtree (a fully selected node is cleared,
/// anything else is selected). Single-select replaces the selection with
/// the clicked subtree.
pub fn toggle(
    nodes: &mut [SlicerNode],
    index: &TreeIndex,
    path: &NodePath,
    settings: &SlicerSettings,
) -> bool {
    if *path == NodePath::select_all() {
        if !nodes.iter().any(|n| n.is_select_all()) {
            return false;
        }
        let all_selected = nodes
            .iter()
            .filter(|n| n.is_member())
            .all(SlicerNode::is_fully_selected);
        set_all(nodes, !all_selected);
        recompute(nodes, index);
        return true;
    }

    let Some(at) = index.get(path) else {
        tracing::debug!(path = %path, "Click on unknown node ignored");
        return false;
    };

    if settings.selection.single_select {
        set_all(nodes, false);
        set_subtree(nodes, index, at, true);
    } else {
        let select = !nodes[at].is_fully_selected();
        set_subtree(nodes, index, at, select);
    }
    recompute(nodes, index);
    if settings.selection.single_select {
        enforce_single_select(nodes, index);
    }
    true
}

/// Clear the selection. Single-select falls back to the first member.
pub fn clear(nodes: &mut [SlicerNode], index: &TreeIndex, settings: &SlicerSettings) {
    set_all(nodes, false);
    if settings.selection.single_select {
        if let Some(first) = nodes.iter().position(SlicerNode::is_member) {
            set_subtree(nodes, index, first, true);
        }
    }
    recompute(nodes, index);
}

// ============================================================================
// SINGLE SELECT
// ============================================================================

/// Collapse the selection to one node at the shallowest partial level (or
/// the shallowest selected level when nothing is partial).
///
/// The first node in list order wins. Returns true when anything changed.
pub fn enforce_single_select(nodes: &mut [SlicerNode], index: &TreeIndex) -> bool {
    let selected: Vec<(usize, usize, bool)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_member() && n.selected)
        .map(|(i, n)| (i, n.level, n.partial_selected))
        .collect();
    let level = selected
        .iter()
        .filter(|(_, _, partial)| *partial)
        .map(|(_, level, _)| *level)
        .min()
        .or_else(|| selected.iter().map(|(_, level, _)| *level).min());
    let Some(level) = level else {
        return false;
    };

    let at_level: Vec<usize> = selected
        .iter()
        .filter(|(_, l, _)| *l == level)
        .map(|(i, _, _)| *i)
        .collect();
    if at_level.len() <= 1 {
        return false;
    }

    tracing::debug!(
        level,
        dropped = at_level.len() - 1,
        "Single-select kept the first selected node"
    );
    for &i in &at_level[1..] {
        set_subtree(nodes, index, i, false);
    }
    recompute(nodes, index);
    true
}

// ============================================================================
// VISIBILITY
// ============================================================================

/// Expand-driven visibility. Root-level members and select-all are always
/// visible; anything else is visible when every ancestor is expanded.
pub fn apply_expand_visibility(nodes: &mut [SlicerNode], index: &TreeIndex, expanded: &[NodePath]) {
    let expanded: HashSet<&NodePath> = expanded.iter().collect();
    for node in nodes.iter_mut() {
        node.is_expand = node.is_member() && expanded.contains(&node.path);
    }

    // Pre-order: a parent is always resolved before its children.
    for i in 0..nodes.len() {
        if nodes[i].is_select_all() {
            nodes[i].is_hidden = false;
            continue;
        }
        let hidden = match index.get(&nodes[i].parent_path) {
            Some(p) => nodes[p].is_hidden || !nodes[p].is_expand,
            None => false,
        };
        nodes[i].is_hidden = hidden;
    }
}

/// Case-insensitive label predicate for a search mode.
pub fn search_pattern(text: &str, mode: SearchMode) -> SlicerResult<Regex> {
    let escaped = regex::escape(text);
    let pattern = match mode {
        SearchMode::Exact => format!("^{}$", escaped),
        SearchMode::StartsWith => format!("^{}", escaped),
        SearchMode::EndsWith => format!("{}$", escaped),
        SearchMode::Contains => escaped,
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| SlicerError::Config {
            reason: format!("invalid search pattern: {}", e),
        })
}

/// Search-driven visibility. Returns the number of visible nodes.
///
/// Matches and their ancestors are visible and ancestors are expanded.
/// With `include_selection` selected members and select-all stay visible.
pub fn apply_search_visibility(
    nodes: &mut [SlicerNode],
    index: &TreeIndex,
    text: &str,
    settings: &SlicerSettings,
) -> SlicerResult<usize> {
    let pattern = search_pattern(text.trim(), settings.search.mode)?;
    let include_selection = settings.search.include_selection;

    let mut visible = vec![false; nodes.len()];
    let mut opened = vec![false; nodes.len()];
    for i in 0..nodes.len() {
        if nodes[i].is_member() && pattern.is_match(&nodes[i].label) {
            visible[i] = true;
            for a in index.ancestors(nodes, i) {
                visible[a] = true;
                opened[a] = true;
            }
        }
    }
    if include_selection {
        for (i, node) in nodes.iter().enumerate() {
            if node.is_select_all() || (node.is_member() && node.selected) {
                visible[i] = true;
            }
        }
    }

    for (i, node) in nodes.iter_mut().enumerate() {
        node.is_hidden = !visible[i];
        node.is_expand = opened[i];
    }
    let count = visible.iter().filter(|v| **v).count();
    tracing::debug!(text, visible = count, "Applied search visibility");
    Ok(count)
}
