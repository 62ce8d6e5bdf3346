//! Selection → host filter.
//!
//! The filter depth is one past the deepest partially selected node (or
//! the root level when nothing is partial). Every selected member at that
//! depth contributes one tuple of its raw values from the root down. A
//! selected leaf above the depth is padded with nulls to the full width.
//!
//! Callers holding a pruned tree serialize the full tree with the selection
//! projected onto it (`selection::project_onto_full_tree`), so every
//! selected branch reaches the depth.

use crate::config::{SearchMode, SlicerSettings};
use crate::error::{SlicerError, SlicerResult};
use crate::filter::model::{
    AdvancedCondition, AdvancedFilter, Condition, ConditionArg, ConditionOperator, Filter,
    FilterInstruction, FilterTarget, LogicalOperator, TupleElement, TupleFilter, FILTER_KEY,
    SELF_FILTER_KEY,
};
use crate::tree::SlicerNode;
use crate::value::{ColumnMetadata, PrimitiveValue};

/// Depth (0-based level) tuples are emitted at.
pub fn filter_depth(nodes: &[SlicerNode], level_count: usize) -> usize {
    let depth = nodes
        .iter()
        .filter(|n| n.is_member() && n.partial_selected)
        .map(|n| n.level + 1)
        .max()
        .unwrap_or(0);
    depth.min(level_count.saturating_sub(1))
}

/// Build the instruction for the current selection.
///
/// No selected members yields `Remove`.
///
/// # Errors
/// `MissingFilterTarget` when a level up to the filter depth has no
/// resolvable target.
pub fn serialize_selection(
    nodes: &[SlicerNode],
    levels: &[ColumnMetadata],
) -> SlicerResult<FilterInstruction> {
    if levels.is_empty() || !nodes.iter().any(|n| n.is_member() && n.selected) {
        return Ok(FilterInstruction::Remove { key: FILTER_KEY });
    }

    let depth = filter_depth(nodes, levels.len());
    let targets = levels[..=depth]
        .iter()
        .enumerate()
        .map(|(level, column)| FilterTarget::for_column(column, level))
        .collect::<SlicerResult<Vec<_>>>()?;

    let rows: Vec<Vec<PrimitiveValue>> = nodes
        .iter()
        .filter(|n| n.is_member() && n.selected)
        .filter(|n| n.level == depth || (n.is_leaf && n.level < depth))
        .map(|n| {
            let mut row: Vec<PrimitiveValue> = n.value.iter().take(depth + 1).cloned().collect();
            row.resize(depth + 1, PrimitiveValue::Null);
            row
        })
        .collect();

    if rows.is_empty() {
        return Err(SlicerError::malformed(format!(
            "no selected members at filter depth {}",
            depth
        )));
    }

    let where_condition = targets
        .iter()
        .any(FilterTarget::is_hierarchy_level)
        .then(|| Condition::In {
            args: levels[..=depth]
                .iter()
                .map(|c| ConditionArg {
                    level: Some(c.level_name().to_string()),
                    ref_name: Some(c.display_name.clone()),
                })
                .collect(),
            values: rows.clone(),
        });

    let values = rows
        .into_iter()
        .map(|row| row.into_iter().map(TupleElement::from).collect())
        .collect::<Vec<_>>();

    tracing::debug!(
        depth,
        tuples = values.len(),
        "Serialized slicer selection"
    );

    Ok(FilterInstruction::Merge {
        key: FILTER_KEY,
        filter: Filter::Tuple(TupleFilter::new(targets, values)),
        where_condition,
    })
}

/// Self-filter for search text on the deepest level.
///
/// Empty text yields `Remove`. `EndsWith` has no host operator and is sent
/// as `Contains`; local visibility narrows it further.
pub fn serialize_search(
    text: &str,
    levels: &[ColumnMetadata],
    settings: &SlicerSettings,
) -> SlicerResult<FilterInstruction> {
    let text = text.trim();
    let Some(deepest) = levels.len().checked_sub(1) else {
        return Ok(FilterInstruction::Remove {
            key: SELF_FILTER_KEY,
        });
    };
    if text.is_empty() {
        return Ok(FilterInstruction::Remove {
            key: SELF_FILTER_KEY,
        });
    }

    let target = FilterTarget::for_column(&levels[deepest], deepest)?;
    let operator = match settings.search.mode {
        SearchMode::Exact => ConditionOperator::Is,
        SearchMode::StartsWith => ConditionOperator::StartsWith,
        SearchMode::Contains | SearchMode::EndsWith => ConditionOperator::Contains,
    };

    Ok(FilterInstruction::Merge {
        key: SELF_FILTER_KEY,
        filter: Filter::Advanced(AdvancedFilter::new(
            target,
            LogicalOperator::And,
            vec![AdvancedCondition {
                operator,
                value: PrimitiveValue::Text(text.to_string()),
            }],
        )),
        where_condition: None,
    })
}
