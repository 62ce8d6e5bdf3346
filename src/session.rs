//! Interactive slicer session.
//!
//! A session owns the node list between two host updates. Clicks, searches
//! and expand/collapse mutate it in place and hand back what the host
//! should persist; the next host update discards the session and builds a
//! new one.

use std::collections::HashSet;

use crate::config::SlicerSettings;
use crate::converter::{self, HostUpdate, SlicerData};
use crate::filter::{self, FilterInstruction, FILTER_KEY};
use crate::identity::{self, NodePath};
use crate::selection;
use crate::tree::{SlicerNode, TreeIndex};
use crate::value::ColumnMetadata;

/// Per-update slicer state.
#[derive(Debug)]
pub struct SlicerSession {
    settings: SlicerSettings,
    levels: Vec<ColumnMetadata>,
    nodes: Vec<SlicerNode>,
    full_tree: Vec<SlicerNode>,
    index: TreeIndex,
    expanded: Vec<NodePath>,
    search: String,
}

impl SlicerSession {
    /// Build a session from a host update. `None` when there is nothing to
    /// show (empty dataset or a logged conversion failure).
    pub fn from_update(update: &HostUpdate, settings: SlicerSettings) -> Option<Self> {
        converter::convert(update, &settings).map(|data| Self::from_data(data, settings))
    }

    pub fn from_data(data: SlicerData, settings: SlicerSettings) -> Self {
        let index = TreeIndex::new(&data.nodes);
        Self {
            settings,
            levels: data.levels,
            nodes: data.nodes,
            full_tree: data.full_tree,
            index,
            expanded: data.expanded,
            search: String::new(),
        }
    }

    pub fn settings(&self) -> &SlicerSettings {
        &self.settings
    }

    pub fn levels(&self) -> &[ColumnMetadata] {
        &self.levels
    }

    pub fn nodes(&self) -> &[SlicerNode] {
        &self.nodes
    }

    pub fn full_tree(&self) -> &[SlicerNode] {
        &self.full_tree
    }

    pub fn node(&self, path: &NodePath) -> Option<&SlicerNode> {
        if *path == NodePath::select_all() {
            return self.nodes.iter().find(|n| n.is_select_all());
        }
        self.index.get(path).map(|i| &self.nodes[i])
    }

    /// Nodes the renderer should draw, in list order.
    pub fn visible_nodes(&self) -> Vec<&SlicerNode> {
        self.nodes.iter().filter(|n| !n.is_hidden).collect()
    }

    pub fn selected_paths(&self) -> Vec<&NodePath> {
        self.nodes
            .iter()
            .filter(|n| n.is_member() && n.selected)
            .map(|n| &n.path)
            .collect()
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Click on a node (or the select-all node).
    ///
    /// Returns the filter instruction for the new selection, or `None` when
    /// the path is unknown or the filter could not be built.
    pub fn click(&mut self, path: &NodePath) -> Option<FilterInstruction> {
        if !selection::toggle(&mut self.nodes, &self.index, path, &self.settings) {
            return None;
        }
        self.refresh_visibility();
        self.filter_instruction()
    }

    /// Clear the selection (single-select keeps the first member).
    pub fn clear(&mut self) -> Option<FilterInstruction> {
        selection::clear(&mut self.nodes, &self.index, &self.settings);
        self.refresh_visibility();
        self.filter_instruction()
    }

    /// Filter instruction for the current selection.
    ///
    /// Serialized over the full tree so pruned members still carry their
    /// branch. Failures are logged; the caller sends nothing.
    pub fn filter_instruction(&self) -> Option<FilterInstruction> {
        let full = selection::project_onto_full_tree(&self.nodes, &self.index, &self.full_tree);
        match filter::serialize_selection(&full, &self.levels) {
            Ok(instruction) => Some(instruction),
            Err(e) => {
                tracing::error!(
                    code = e.code(),
                    error = %e,
                    key = FILTER_KEY.property_name,
                    "Failed to build slicer filter"
                );
                None
            }
        }
    }

    // =========================================================================
    // EXPAND / COLLAPSE
    // =========================================================================

    /// Toggle a node's expansion. Returns the expanded-paths string to
    /// persist, or `None` for unknown paths and leaves.
    pub fn toggle_expand(&mut self, path: &NodePath) -> Option<String> {
        let i = self.index.get(path)?;
        if self.index.children(path).is_empty() {
            return None;
        }

        if let Some(pos) = self.expanded.iter().position(|p| p == path) {
            self.expanded.remove(pos);
        } else {
            self.expanded.push(path.clone());
        }
        tracing::debug!(
            path = %path,
            expanded = !self.nodes[i].is_expand,
            "Toggled slicer node"
        );
        self.refresh_visibility();
        Some(self.expanded_string())
    }

    /// Expand every node that has children.
    pub fn expand_all(&mut self) -> String {
        self.expanded = self
            .nodes
            .iter()
            .filter(|n| n.is_member() && !self.index.children(&n.path).is_empty())
            .map(|n| n.path.clone())
            .collect();
        self.refresh_visibility();
        self.expanded_string()
    }

    pub fn collapse_all(&mut self) -> String {
        self.expanded.clear();
        self.refresh_visibility();
        self.expanded_string()
    }

    pub fn expanded(&self) -> &[NodePath] {
        &self.expanded
    }

    /// Expanded paths in the persisted encoding.
    pub fn expanded_string(&self) -> String {
        identity::encode_list(&self.expanded)
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Set the search text and recompute visibility.
    ///
    /// With the self-filter enabled, returns the instruction for the search
    /// filter slot (merge for text, remove for empty text).
    pub fn search(&mut self, text: &str) -> Option<FilterInstruction> {
        self.search = text.trim().to_string();
        self.refresh_visibility();

        if !self.settings.selection.self_filter_enabled {
            return None;
        }
        match filter::serialize_search(&self.search, &self.levels, &self.settings) {
            Ok(instruction) => Some(instruction),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Failed to build search filter");
                None
            }
        }
    }

    fn refresh_visibility(&mut self) {
        if !self.search.is_empty() {
            match selection::apply_search_visibility(
                &mut self.nodes,
                &self.index,
                &self.search,
                &self.settings,
            ) {
                Ok(_) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "Search failed; showing expanded tree");
                }
            }
        }

        // Drop paths that no longer exist in this tree.
        let known: HashSet<&NodePath> = self.nodes.iter().map(|n| &n.path).collect();
        self.expanded.retain(|p| known.contains(p));
        selection::apply_expand_visibility(&mut self.nodes, &self.index, &self.expanded);
    }
}
