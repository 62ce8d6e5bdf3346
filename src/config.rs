//! Slicer settings.
//!
//! Settings are parsed by the host from its own configuration objects and
//! handed to every entry point explicitly. They can also be loaded from YAML:
//!
//! ```yaml
//! selection:
//!   single_select: false
//!   select_all_enabled: true
//! hierarchy:
//!   hide_members: empty
//!   empty_leaf_label: "(Blank)"
//! search:
//!   mode: starts_with
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SlicerError, SlicerResult};

/// Default cap on the number of nodes a single update is expected to produce.
pub const DEFAULT_MAX_NODES: usize = 50_000;

/// Root settings object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerSettings {
    pub selection: SelectionSettings,
    pub hierarchy: HierarchySettings,
    pub search: SearchSettings,
}

/// Selection behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Only one node (and its subtree) may be selected at a time.
    pub single_select: bool,
    /// Prepend a synthetic "select all" node in multi-select mode.
    pub select_all_enabled: bool,
    /// Label of the synthetic "select all" node.
    pub select_all_label: String,
    /// Selection state of every node when nothing has been persisted.
    pub default_selected: bool,
    /// Send search text to the host as a filter on the slicer's own data.
    pub self_filter_enabled: bool,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            single_select: true,
            select_all_enabled: false,
            select_all_label: "Select all".to_string(),
            default_selected: false,
            self_filter_enabled: false,
        }
    }
}

/// How incomplete (ragged) hierarchy members are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideMembers {
    /// Keep every member; blanks get the empty-leaf label.
    #[default]
    Never,
    /// Hide members whose value is empty.
    Empty,
    /// Hide members whose value equals their parent's value.
    ParentName,
}

/// Tree shape settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchySettings {
    pub hide_members: HideMembers,
    /// Label shown for blank members when they are not hidden.
    pub empty_leaf_label: String,
    /// Persisted expanded-paths string (see `identity::encode_list`).
    pub expanded: String,
    pub max_nodes: usize,
}

impl Default for HierarchySettings {
    fn default() -> Self {
        Self {
            hide_members: HideMembers::Never,
            empty_leaf_label: "(Blank)".to_string(),
            expanded: String::new(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// How search text is matched against node labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Contains,
    Exact,
    StartsWith,
    EndsWith,
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub mode: SearchMode,
    /// Keep selected nodes visible while searching.
    pub include_selection: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            mode: SearchMode::Contains,
            include_selection: true,
        }
    }
}

impl SlicerSettings {
    /// Load from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> SlicerResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SlicerError::Config {
            reason: e.to_string(),
        })
    }

    /// Load from a YAML file.
    pub fn from_file(path: &Path) -> SlicerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SlicerError::Config {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Builder: toggle single-select mode.
    pub fn with_single_select(mut self, single: bool) -> Self {
        self.selection.single_select = single;
        self
    }

    /// Builder: enable or disable the "select all" node.
    pub fn with_select_all(mut self, enabled: bool) -> Self {
        self.selection.select_all_enabled = enabled;
        self
    }

    /// Builder: set the hide-members policy.
    pub fn with_hide_members(mut self, policy: HideMembers) -> Self {
        self.hierarchy.hide_members = policy;
        self
    }

    /// Builder: set the persisted expanded-paths string.
    pub fn with_expanded(mut self, expanded: impl Into<String>) -> Self {
        self.hierarchy.expanded = expanded.into();
        self
    }

    /// Builder: set the search mode.
    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search.mode = mode;
        self
    }

    /// Builder: keep selected nodes visible while searching.
    pub fn with_include_selection(mut self, include: bool) -> Self {
        self.search.include_selection = include;
        self
    }

    /// Builder: enable the search self-filter.
    pub fn with_self_filter(mut self, enabled: bool) -> Self {
        self.selection.self_filter_enabled = enabled;
        self
    }

    /// Whether the synthetic "select all" node should be emitted.
    pub fn shows_select_all(&self) -> bool {
        self.selection.select_all_enabled && !self.selection.single_select
    }
}
