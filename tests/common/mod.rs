//! Shared fixtures for integration tests.

#![allow(dead_code)]

use hierarchy_slicer::filter::{FilterInstruction, PersistedState};
use hierarchy_slicer::value::ColumnSource;
use hierarchy_slicer::{
    ColumnMetadata, ColumnType, HostUpdate, MatrixResult, NodePath, SlicerNode, SlicerSession,
    SlicerSettings,
};
use serde_json::{json, Value};

/// Text levels bound as `Data.<name>` columns.
pub fn text_levels(names: &[&str]) -> Vec<ColumnMetadata> {
    names
        .iter()
        .map(|name| {
            ColumnMetadata::new(*name, ColumnType::text()).with_query_name(format!("Data.{}", name))
        })
        .collect()
}

/// Text levels bound as levels of the `Data.Tree` hierarchy.
pub fn hierarchy_levels(names: &[&str]) -> Vec<ColumnMetadata> {
    names
        .iter()
        .map(|name| {
            ColumnMetadata::new(*name, ColumnType::text()).with_source(ColumnSource {
                table: "Data".into(),
                column: None,
                hierarchy: Some("Tree".into()),
                hierarchy_level: Some(name.to_string()),
            })
        })
        .collect()
}

/// Two-level hierarchy with a blank member under `L1`.
pub fn ragged_rows() -> Vec<Vec<Value>> {
    vec![
        vec![json!("L_2"), json!("L12")],
        vec![json!("L1"), Value::Null],
        vec![json!("L1"), json!("L11")],
        vec![json!("L1"), json!("L12")],
        vec![json!("L1"), json!("L13")],
    ]
}

/// Three-level hierarchy with `L_` labels spread across levels.
pub fn search_rows() -> Vec<Vec<Value>> {
    vec![
        vec![json!("L_1"), json!("L_11"), json!("x")],
        vec![json!("L_1"), json!("L12"), json!("y")],
        vec![json!("L2"), json!("L_21"), json!("z")],
        vec![json!("L2"), json!("L22"), json!("w")],
        vec![json!("L3"), json!("L31"), json!("L_5")],
    ]
}

/// Full binary-ish tree: 2 roots × 2 children × 2 leaves.
pub fn uniform_rows() -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    for a in ["A", "B"] {
        for b in ["1", "2"] {
            for c in ["x", "y"] {
                rows.push(vec![json!(a), json!(format!("{}{}", a, b)), json!(c)]);
            }
        }
    }
    rows
}

/// Three levels where `North/North` repeats its parent next to a regular
/// `North/Nordics` branch. Pruned under `HideMembers::ParentName`.
pub fn parent_name_rows() -> Vec<Vec<Value>> {
    vec![
        vec![json!("North"), json!("North"), json!("Oslo")],
        vec![json!("North"), json!("North"), json!("Bergen")],
        vec![json!("North"), json!("Nordics"), json!("Helsinki")],
        vec![json!("South"), json!("Italy"), json!("Rome")],
        vec![json!("South"), json!("Italy"), json!("Milan")],
    ]
}

/// Three levels with blank members, a blank-only branch and a short row.
/// Pruned under `HideMembers::Empty`.
pub fn blank_member_rows() -> Vec<Vec<Value>> {
    vec![
        vec![json!("A"), Value::Null],
        vec![json!("B"), json!("b1"), json!("x")],
        vec![json!("B"), json!("b1"), json!("y")],
        vec![json!("B"), json!("b2"), json!("z")],
        vec![json!("C"), Value::Null, json!("w")],
        vec![json!("C"), json!("c1"), json!("v")],
        vec![json!("D")],
    ]
}

pub fn update(levels: Vec<ColumnMetadata>, rows: &[Vec<Value>]) -> HostUpdate {
    HostUpdate::new(MatrixResult::from_rows(levels, rows))
}

pub fn session(levels: Vec<ColumnMetadata>, rows: &[Vec<Value>], settings: SlicerSettings) -> SlicerSession {
    SlicerSession::from_update(&update(levels, rows), settings).expect("non-empty fixture")
}

pub fn multi_select() -> SlicerSettings {
    SlicerSettings::default().with_single_select(false)
}

pub fn path(segments: &[&str]) -> NodePath {
    NodePath::from(segments)
}

/// Persisted state the host would hand back after applying `instruction`.
pub fn persisted(instruction: &FilterInstruction) -> PersistedState {
    match instruction {
        FilterInstruction::Merge {
            filter,
            where_condition,
            ..
        } => PersistedState {
            filter: Some(filter.clone()),
            where_condition: where_condition.clone(),
            legacy_selection: None,
        },
        FilterInstruction::Remove { .. } => PersistedState::default(),
    }
}

/// Selection state per member, for comparing sessions.
pub fn selection_state(nodes: &[SlicerNode]) -> Vec<(NodePath, bool, bool)> {
    nodes
        .iter()
        .filter(|n| n.is_member())
        .map(|n| (n.path.clone(), n.selected, n.partial_selected))
        .collect()
}
