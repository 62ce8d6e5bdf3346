//! Host update → slicer data.
//!
//! ```text
//! HostUpdate { matrix, persisted state }
//!     │
//!     ├── TreeBuilder::build          (EmptyDataset short-circuits here)
//!     ├── filter::selected_paths      (errors logged, empty selection)
//!     ├── selection::apply_filter
//!     └── selection::apply_expand_visibility
//!     ▼
//! SlicerData { nodes, full_tree, levels, expanded }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::SlicerSettings;
use crate::error::{SlicerError, SlicerResult};
use crate::filter::{selected_paths_or_empty, PersistedState};
use crate::identity::{self, NodePath};
use crate::matrix::MatrixResult;
use crate::selection;
use crate::tree::{SlicerNode, TreeBuilder, TreeIndex};
use crate::value::ColumnMetadata;

/// Everything the host passes on a data update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostUpdate {
    pub matrix: MatrixResult,
    #[serde(flatten)]
    pub persisted: PersistedState,
}

impl HostUpdate {
    pub fn new(matrix: MatrixResult) -> Self {
        Self {
            matrix,
            persisted: PersistedState::default(),
        }
    }

    /// Builder: attach persisted selection state.
    pub fn with_persisted(mut self, persisted: PersistedState) -> Self {
        self.persisted = persisted;
        self
    }
}

/// Result of a conversion, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlicerData {
    /// Working list (ragged members pruned) with selection and visibility.
    pub nodes: Vec<SlicerNode>,
    /// Every member as built.
    pub full_tree: Vec<SlicerNode>,
    pub levels: Vec<ColumnMetadata>,
    pub expanded: Vec<NodePath>,
}

/// Convert a host update, propagating errors.
pub fn try_convert(update: &HostUpdate, settings: &SlicerSettings) -> SlicerResult<SlicerData> {
    let built = TreeBuilder::new(settings).build(&update.matrix)?;
    let levels = update.matrix.levels.clone();

    let mut nodes = built.nodes;
    let index = TreeIndex::new(&nodes);

    let selected = selected_paths_or_empty(&update.persisted, &levels);
    selection::apply_filter(&mut nodes, &index, &selected, settings);

    let expanded = decode_expanded(&settings.hierarchy.expanded);
    selection::apply_expand_visibility(&mut nodes, &index, &expanded);

    tracing::debug!(
        nodes = nodes.len(),
        selected = nodes.iter().filter(|n| n.is_member() && n.selected).count(),
        expanded = expanded.len(),
        "Converted host update"
    );

    Ok(SlicerData {
        nodes,
        full_tree: built.full_tree,
        levels,
        expanded,
    })
}

/// Convert a host update. Failures are logged and yield `None`.
pub fn convert(update: &HostUpdate, settings: &SlicerSettings) -> Option<SlicerData> {
    match try_convert(update, settings) {
        Ok(data) => Some(data),
        Err(SlicerError::EmptyDataset) => {
            tracing::debug!("Host update has no data; nothing to render");
            None
        }
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Slicer conversion failed");
            None
        }
    }
}

/// Decode the persisted expanded-paths string, dropping it when unreadable.
pub fn decode_expanded(expanded: &str) -> Vec<NodePath> {
    identity::decode_list(expanded).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable expanded paths");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterTarget, TupleElement, TupleFilter};
    use crate::value::{ColumnType, PrimitiveValue};
    use serde_json::json;

    fn matrix() -> MatrixResult {
        MatrixResult::from_rows(
            vec![
                ColumnMetadata::new("Region", ColumnType::text()).with_query_name("Geo.Region"),
                ColumnMetadata::new("City", ColumnType::text()).with_query_name("Geo.City"),
            ],
            &[
                vec![json!("North"), json!("Oslo")],
                vec![json!("North"), json!("Bergen")],
                vec![json!("South"), json!("Rome")],
            ],
        )
    }

    #[test]
    fn test_empty_matrix_returns_none() {
        let update = HostUpdate::default();
        assert!(convert(&update, &SlicerSettings::default()).is_none());
        assert_eq!(
            try_convert(&update, &SlicerSettings::default()).unwrap_err(),
            SlicerError::EmptyDataset
        );
    }

    #[test]
    fn test_convert_applies_filter_and_expansion() {
        let settings = SlicerSettings::default()
            .with_single_select(false)
            .with_expanded("[North]#");
        let update = HostUpdate::new(matrix()).with_persisted(PersistedState {
            filter: Some(Filter::Tuple(TupleFilter::new(
                vec![
                    FilterTarget::Column {
                        table: "Geo".into(),
                        column: "Region".into(),
                    },
                    FilterTarget::Column {
                        table: "Geo".into(),
                        column: "City".into(),
                    },
                ],
                vec![vec![
                    TupleElement::from(PrimitiveValue::Text("North".into())),
                    TupleElement::from(PrimitiveValue::Text("Bergen".into())),
                ]],
            ))),
            ..Default::default()
        });

        let data = convert(&update, &settings).unwrap();
        assert_eq!(data.nodes.len(), 5);
        assert_eq!(data.expanded, vec![NodePath::from(["North"])]);

        let north = &data.nodes[0];
        assert!(north.selected && north.partial_selected && north.is_expand);
        let bergen = data.nodes.iter().find(|n| n.label == "Bergen").unwrap();
        assert!(bergen.selected && !bergen.is_hidden);
        let rome = data.nodes.iter().find(|n| n.label == "Rome").unwrap();
        assert!(!rome.selected && rome.is_hidden);
    }

    #[test]
    fn test_malformed_filter_degrades_to_empty_selection() {
        let update = HostUpdate::new(matrix()).with_persisted(PersistedState {
            filter: Some(Filter::Tuple(TupleFilter::new(vec![], vec![]))),
            ..Default::default()
        });
        let settings = SlicerSettings::default().with_single_select(false);
        let data = convert(&update, &settings).unwrap();
        assert!(data.nodes.iter().all(|n| !n.selected));
    }

    #[test]
    fn test_host_update_json_shape() {
        let update: HostUpdate = serde_json::from_value(json!({
            "matrix": {
                "levels": [{"displayName": "Region", "type": {"text": true}}],
                "rows": [{"value": "North"}]
            },
            "legacySelection": "North"
        }))
        .unwrap();
        let data = convert(&update, &SlicerSettings::default()).unwrap();
        assert!(data.nodes[0].selected);
    }

    #[test]
    fn test_unreadable_expanded_is_ignored() {
        assert!(decode_expanded("[open").is_empty());
    }
}
