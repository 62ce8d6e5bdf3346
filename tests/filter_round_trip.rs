//! Selection → filter → selection through persisted host state.

mod common;

use common::*;
use hierarchy_slicer::filter::{Condition, Filter, PersistedState};
use hierarchy_slicer::value::ColumnType;
use hierarchy_slicer::{
    ColumnMetadata, FilterInstruction, HideMembers, PrimitiveValue, SlicerSession, SlicerSettings,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn restore(
    levels: Vec<ColumnMetadata>,
    rows: &[Vec<serde_json::Value>],
    persisted: PersistedState,
) -> SlicerSession {
    restore_with(levels, rows, persisted, multi_select())
}

fn restore_with(
    levels: Vec<ColumnMetadata>,
    rows: &[Vec<serde_json::Value>],
    persisted: PersistedState,
    settings: SlicerSettings,
) -> SlicerSession {
    let update = update(levels, rows).with_persisted(persisted);
    SlicerSession::from_update(&update, settings).unwrap()
}

fn tuple_rows(instruction: &FilterInstruction) -> Vec<Vec<PrimitiveValue>> {
    let Some(Filter::Tuple(tuple)) = instruction.filter() else {
        panic!("expected tuple filter, got {:?}", instruction);
    };
    tuple
        .values
        .iter()
        .map(|row| row.iter().map(|e| e.value.clone()).collect())
        .collect()
}

fn text(s: &str) -> PrimitiveValue {
    PrimitiveValue::Text(s.into())
}

/// Click a subset of the working leaves, serialize, restore, and compare.
fn leaf_subset_round_trip(
    rows: &[Vec<serde_json::Value>],
    settings: SlicerSettings,
    picks: &[bool],
) -> Result<(), TestCaseError> {
    let levels = text_levels(&["A", "B", "C"]);
    let mut original = session(levels.clone(), rows, settings.clone());
    let leaves: Vec<_> = original
        .nodes()
        .iter()
        .filter(|n| n.is_member() && n.is_leaf)
        .map(|n| n.path.clone())
        .collect();
    for (leaf, pick) in leaves.iter().zip(picks) {
        if *pick {
            original.click(leaf);
        }
    }

    let Some(instruction) = original.filter_instruction() else {
        return Err(TestCaseError::fail("filter should always build"));
    };
    let restored = restore_with(levels, rows, persisted(&instruction), settings);
    prop_assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
    Ok(())
}

#[test]
fn test_full_level_selection_round_trips() {
    let levels = text_levels(&["A", "B", "C"]);
    let rows = uniform_rows();
    for k in 0..3 {
        let mut original = session(levels.clone(), &rows, multi_select());
        let at_level: Vec<_> = original
            .nodes()
            .iter()
            .filter(|n| n.level == k)
            .map(|n| n.path.clone())
            .collect();
        let mut instruction = None;
        for p in &at_level {
            instruction = original.click(p);
        }
        let instruction = instruction.unwrap();

        let restored = restore(levels.clone(), &rows, persisted(&instruction));
        let selected_at = |s: &SlicerSession| -> Vec<_> {
            s.nodes()
                .iter()
                .filter(|n| n.level == k && n.selected)
                .map(|n| n.path.clone())
                .collect()
        };
        assert_eq!(selected_at(&restored), at_level, "level {}", k);
    }
}

#[test]
fn test_hierarchy_levels_round_trip_through_where_condition() {
    let levels = hierarchy_levels(&["A", "B", "C"]);
    let rows = uniform_rows();
    let mut original = session(levels.clone(), &rows, multi_select());
    original.click(&path(&["A", "A1", "y"])).unwrap();
    let instruction = original.click(&path(&["B", "B2"])).unwrap();

    let FilterInstruction::Merge {
        where_condition: Some(Condition::In { args, .. }),
        ..
    } = &instruction
    else {
        panic!("expected a where condition");
    };
    assert_eq!(args.len(), 3);

    let restored = restore(levels, &rows, persisted(&instruction));
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

#[test]
fn test_numeric_and_date_levels_round_trip() {
    let levels = vec![
        ColumnMetadata::new("Year", ColumnType::integer()).with_query_name("Sales.Year"),
        ColumnMetadata::new("Day", ColumnType::date_time())
            .with_query_name("Sales.Day")
            .with_format("dd/MM/yyyy"),
    ];
    let rows = vec![
        vec![json!(2018), json!("2018-03-09T00:00:00.000Z")],
        vec![json!(2018), json!("2018-03-10T00:00:00.000Z")],
        vec![json!(2019), json!("2019-01-01T00:00:00.000Z")],
    ];
    let mut original = session(levels.clone(), &rows, multi_select());
    let instruction = original.click(&path(&["2018", "10/03/2018"])).unwrap();

    let restored = restore(levels, &rows, persisted(&instruction));
    assert!(restored.node(&path(&["2018", "10/03/2018"])).unwrap().selected);
    assert!(!restored.node(&path(&["2018", "09/03/2018"])).unwrap().selected);
    assert!(restored.node(&path(&["2018"])).unwrap().partial_selected);
}

#[test]
fn test_wire_json_round_trip() {
    let levels = text_levels(&["A", "B", "C"]);
    let rows = uniform_rows();
    let mut original = session(levels.clone(), &rows, multi_select());
    let instruction = original.click(&path(&["A", "A2"])).unwrap();

    let wire = serde_json::to_value(instruction.filter().unwrap()).unwrap();
    let persisted: PersistedState = serde_json::from_value(json!({ "filter": wire })).unwrap();
    let restored = restore(levels, &rows, persisted);
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

#[test]
fn test_legacy_selection_string() {
    let levels = text_levels(&["A", "B", "C"]);
    let persisted = PersistedState {
        legacy_selection: Some("A_A1,B".into()),
        ..Default::default()
    };
    let restored = restore(levels, &uniform_rows(), persisted);

    assert!(restored.node(&path(&["A", "A1"])).unwrap().is_fully_selected());
    assert!(restored.node(&path(&["A", "A1", "x"])).unwrap().selected);
    assert!(restored.node(&path(&["A"])).unwrap().partial_selected);
    // Depth comes from the first path, so the shorter "B" matches nothing.
    assert!(!restored.node(&path(&["B"])).unwrap().selected);
}

#[test]
fn test_clearing_selection_removes_filter() {
    let mut original = session(text_levels(&["A", "B", "C"]), &uniform_rows(), multi_select());
    original.click(&path(&["A"])).unwrap();
    let instruction = original.clear().unwrap();
    assert!(instruction.is_remove());
    assert_eq!(persisted(&instruction), PersistedState::default());
}

#[test]
fn test_reparented_leaf_click_builds_filter() {
    let levels = text_levels(&["A", "B", "C"]);
    let rows = vec![
        vec![json!("A"), json!("A"), json!("x")],
        vec![json!("A"), json!("A"), json!("y")],
        vec![json!("B"), json!("b"), json!("z")],
    ];
    let settings = multi_select().with_hide_members(HideMembers::ParentName);
    let mut original = session(levels.clone(), &rows, settings.clone());
    let instruction = original
        .click(&path(&["A", "A", "x"]))
        .expect("clicking a re-parented leaf yields a filter");

    assert_eq!(tuple_rows(&instruction), vec![vec![text("A"), text("A"), text("x")]]);

    let restored = restore_with(levels, &rows, persisted(&instruction), settings);
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

#[test]
fn test_reparented_branch_serializes_at_pruned_level() {
    let levels = text_levels(&["A", "B", "C"]);
    let rows = parent_name_rows();
    let settings = multi_select().with_hide_members(HideMembers::ParentName);
    let mut original = session(levels.clone(), &rows, settings.clone());
    original.click(&path(&["North", "North", "Oslo"])).unwrap();
    let instruction = original.click(&path(&["North", "North", "Bergen"])).unwrap();

    // Both children of the pruned North/North member are selected.
    assert_eq!(tuple_rows(&instruction), vec![vec![text("North"), text("North")]]);

    let restored = restore_with(levels, &rows, persisted(&instruction), settings);
    assert!(restored.node(&path(&["North", "North", "Oslo"])).unwrap().selected);
    assert!(!restored.node(&path(&["North", "Nordics"])).unwrap().selected);
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

#[test]
fn test_pruned_blank_leaf_survives_round_trip() {
    let levels = text_levels(&["A", "B"]);
    let rows = vec![
        vec![json!("A"), serde_json::Value::Null],
        vec![json!("B"), json!("b1")],
        vec![json!("B"), json!("b2")],
    ];
    let settings = multi_select().with_hide_members(HideMembers::Empty);
    let mut original = session(levels.clone(), &rows, settings.clone());
    original.click(&path(&["A"])).unwrap();
    let instruction = original.click(&path(&["B", "b1"])).unwrap();

    assert_eq!(
        tuple_rows(&instruction),
        vec![
            vec![text("A"), PrimitiveValue::Null],
            vec![text("B"), text("b1")],
        ]
    );

    let restored = restore_with(levels, &rows, persisted(&instruction), settings);
    assert!(restored.node(&path(&["A"])).unwrap().selected);
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

#[test]
fn test_short_row_leaf_survives_round_trip() {
    let levels = text_levels(&["A", "B", "C"]);
    let rows = blank_member_rows();
    let mut original = session(levels.clone(), &rows, multi_select());
    original.click(&path(&["D"])).unwrap();
    let instruction = original.click(&path(&["B", "b1", "x"])).unwrap();

    let rows_out = tuple_rows(&instruction);
    assert!(rows_out.contains(&vec![text("D"), PrimitiveValue::Null, PrimitiveValue::Null]));
    assert!(rows_out.contains(&vec![text("B"), text("b1"), text("x")]));

    let restored = restore(levels, &rows, persisted(&instruction));
    assert!(restored.node(&path(&["D"])).unwrap().selected);
    assert_eq!(
        selection_state(restored.nodes()),
        selection_state(original.nodes())
    );
}

proptest! {
    #[test]
    fn prop_parent_name_leaf_selection_round_trips(
        picks in proptest::collection::vec(any::<bool>(), 5)
    ) {
        let settings = multi_select().with_hide_members(HideMembers::ParentName);
        leaf_subset_round_trip(&parent_name_rows(), settings, &picks)?;
    }

    #[test]
    fn prop_blank_member_leaf_selection_round_trips(
        picks in proptest::collection::vec(any::<bool>(), 7)
    ) {
        let settings = multi_select().with_hide_members(HideMembers::Empty);
        leaf_subset_round_trip(&blank_member_rows(), settings, &picks)?;
    }

    #[test]
    fn prop_short_rows_round_trip_without_pruning(
        picks in proptest::collection::vec(any::<bool>(), 8)
    ) {
        leaf_subset_round_trip(&blank_member_rows(), multi_select(), &picks)?;
    }

    #[test]
    fn prop_leaf_selection_round_trips(picks in proptest::collection::vec(any::<bool>(), 8)) {
        let levels = text_levels(&["A", "B", "C"]);
        let rows = uniform_rows();
        let mut original = session(levels.clone(), &rows, multi_select());
        let leaves: Vec<_> = original
            .nodes()
            .iter()
            .filter(|n| n.is_leaf)
            .map(|n| n.path.clone())
            .collect();
        for (leaf, pick) in leaves.iter().zip(picks) {
            if pick {
                original.click(leaf);
            }
        }

        let Some(instruction) = original.filter_instruction() else {
            return Err(TestCaseError::fail("filter should always build"));
        };
        let restored = restore(levels, &rows, persisted(&instruction));
        prop_assert_eq!(
            selection_state(restored.nodes()),
            selection_state(original.nodes())
        );
    }
}
