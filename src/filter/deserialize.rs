//! Persisted host state → selected paths.
//!
//! Checked in priority order:
//!
//! ```text
//! 1. filter: Tuple     column targets map straight to levels;
//!                      hierarchy targets are recovered via the
//!                      where-condition (or their level names)
//! 2. filter: Basic     root-level values
//! 3. filter: Advanced  root-level `Is` conditions
//! 4. where-condition   AND/OR/Compare/In trees
//! 5. legacy string     comma-joined legacy identifiers
//! ```
//!
//! Every recovered value is re-typed and formatted with its level's column
//! so paths line up with the ones the tree builder produced.

use crate::error::{SlicerError, SlicerResult};
use crate::filter::model::{
    AdvancedFilter, BasicFilter, BasicOperator, Condition, ConditionArg, ConditionOperator,
    Filter, FilterTarget, LogicalOperator, PersistedState, TupleFilter,
};
use crate::format::format_value;
use crate::identity::{self, NodePath};
use crate::value::{ColumnMetadata, PrimitiveValue};

/// Recover selected paths from persisted state.
///
/// # Errors
/// `MalformedFilter` when the filter shape cannot be mapped onto the bound
/// levels. Callers log and fall back to an empty selection.
pub fn selected_paths(
    state: &PersistedState,
    levels: &[ColumnMetadata],
) -> SlicerResult<Vec<NodePath>> {
    if let Some(filter) = &state.filter {
        return match filter {
            Filter::Tuple(tuple) => from_tuple(tuple, state.where_condition.as_ref(), levels),
            Filter::Basic(basic) => from_basic(basic, levels),
            Filter::Advanced(advanced) => from_advanced(advanced, levels),
        };
    }
    if let Some(condition) = &state.where_condition {
        return from_condition(condition, levels);
    }
    match state.legacy_selection.as_deref() {
        Some(legacy) if !legacy.is_empty() => Ok(identity::decode_legacy_list(legacy)),
        _ => Ok(Vec::new()),
    }
}

/// Like `selected_paths`, but logs failures and yields an empty selection.
pub fn selected_paths_or_empty(state: &PersistedState, levels: &[ColumnMetadata]) -> Vec<NodePath> {
    match selected_paths(state, levels) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(
                code = e.code(),
                error = %e,
                "Failed to restore slicer selection; starting empty"
            );
            Vec::new()
        }
    }
}

// ============================================================================
// TUPLE
// ============================================================================

fn from_tuple(
    tuple: &TupleFilter,
    where_condition: Option<&Condition>,
    levels: &[ColumnMetadata],
) -> SlicerResult<Vec<NodePath>> {
    if tuple.target.is_empty() {
        return Err(SlicerError::malformed("tuple filter has no targets"));
    }
    if tuple.target.len() > levels.len() {
        return Err(SlicerError::malformed(format!(
            "tuple filter has {} targets but only {} levels are bound",
            tuple.target.len(),
            levels.len()
        )));
    }
    if tuple.target.iter().any(|t| t.table().is_empty()) {
        return Err(SlicerError::malformed("tuple filter target has no table"));
    }

    let slots = if tuple.target.iter().any(FilterTarget::is_hierarchy_level) {
        if let Some(condition) = where_condition {
            return from_condition(condition, levels);
        }
        tuple
            .target
            .iter()
            .map(|t| {
                t.resolve_level(levels).ok_or_else(|| {
                    SlicerError::malformed(format!("unresolvable hierarchy target {:?}", t))
                })
            })
            .collect::<SlicerResult<Vec<_>>>()?
    } else {
        (0..tuple.target.len()).collect()
    };

    let rows = tuple
        .values
        .iter()
        .map(|row| row.iter().map(|e| e.value.clone()).collect::<Vec<_>>());
    rows_to_paths(&slots, rows, levels)
}

// ============================================================================
// BASIC / ADVANCED (root level only)
// ============================================================================

fn root_level(target: &FilterTarget, levels: &[ColumnMetadata]) -> SlicerResult<()> {
    if target.table().is_empty() {
        return Err(SlicerError::malformed("filter target has no table"));
    }
    match target.resolve_level(levels) {
        Some(0) | None if !levels.is_empty() => Ok(()),
        Some(level) => Err(SlicerError::malformed(format!(
            "single-column filter targets level {} instead of the root",
            level
        ))),
        None => Err(SlicerError::malformed("no levels bound")),
    }
}

fn from_basic(basic: &BasicFilter, levels: &[ColumnMetadata]) -> SlicerResult<Vec<NodePath>> {
    root_level(&basic.target, levels)?;
    if basic.operator != BasicOperator::In {
        tracing::warn!(operator = ?basic.operator, "Ignoring non-In basic filter");
        return Ok(Vec::new());
    }
    basic
        .values
        .iter()
        .map(|v| Ok(NodePath::new(vec![format_level(v.clone(), 0, levels)?])))
        .collect()
}

fn from_advanced(
    advanced: &AdvancedFilter,
    levels: &[ColumnMetadata],
) -> SlicerResult<Vec<NodePath>> {
    root_level(&advanced.target, levels)?;
    if advanced.conditions.is_empty() {
        return Err(SlicerError::malformed("advanced filter has no conditions"));
    }
    let equalities: Vec<&PrimitiveValue> = advanced
        .conditions
        .iter()
        .filter(|c| c.operator == ConditionOperator::Is)
        .map(|c| &c.value)
        .collect();
    if equalities.len() != advanced.conditions.len() {
        tracing::debug!("Advanced filter carries non-equality conditions; not a selection");
        return Ok(Vec::new());
    }
    if advanced.logical_operator == LogicalOperator::And && equalities.len() > 1 {
        return Ok(Vec::new());
    }
    equalities
        .into_iter()
        .map(|v| Ok(NodePath::new(vec![format_level(v.clone(), 0, levels)?])))
        .collect()
}

// ============================================================================
// CONDITION TREES
// ============================================================================

/// Paths described by a condition tree.
///
/// `Or` splits into alternatives; each alternative is either an `In` or an
/// `And` chain of `Compare`s assigning one value per level. Assigned levels
/// must form a contiguous prefix starting at the root.
pub fn from_condition(
    condition: &Condition,
    levels: &[ColumnMetadata],
) -> SlicerResult<Vec<NodePath>> {
    let mut disjuncts = Vec::new();
    flatten_or(condition, &mut disjuncts);

    let mut paths = Vec::new();
    for disjunct in disjuncts {
        match disjunct {
            Condition::In { args, values } => {
                if args.is_empty() {
                    return Err(SlicerError::malformed("in-condition has no arguments"));
                }
                let slots = args
                    .iter()
                    .map(|a| a.resolve(levels))
                    .collect::<SlicerResult<Vec<_>>>()?;
                paths.extend(rows_to_paths(&slots, values.iter().cloned(), levels)?);
            }
            other => {
                let mut compares = Vec::new();
                flatten_and(other, &mut compares)?;
                let mut slots = Vec::with_capacity(compares.len());
                let mut row = Vec::with_capacity(compares.len());
                for (arg, value) in compares {
                    slots.push(arg.resolve(levels)?);
                    row.push(value.clone());
                }
                paths.extend(rows_to_paths(&slots, std::iter::once(row), levels)?);
            }
        }
    }
    Ok(paths)
}

fn flatten_or<'c>(condition: &'c Condition, out: &mut Vec<&'c Condition>) {
    match condition {
        Condition::Or { left, right } => {
            flatten_or(left, out);
            flatten_or(right, out);
        }
        other => out.push(other),
    }
}

fn flatten_and<'c>(
    condition: &'c Condition,
    out: &mut Vec<(&'c ConditionArg, &'c PrimitiveValue)>,
) -> SlicerResult<()> {
    match condition {
        Condition::And { left, right } => {
            flatten_and(left, out)?;
            flatten_and(right, out)
        }
        Condition::Compare { arg, value } => {
            out.push((arg, value));
            Ok(())
        }
        Condition::Or { .. } => Err(SlicerError::malformed("or-condition nested inside and")),
        Condition::In { .. } => Err(SlicerError::malformed("in-condition nested inside and")),
    }
}

// ============================================================================
// ROWS → PATHS
// ============================================================================

/// Turn value rows into paths, where `slots[i]` is the level of column `i`.
fn rows_to_paths(
    slots: &[usize],
    rows: impl Iterator<Item = Vec<PrimitiveValue>>,
    levels: &[ColumnMetadata],
) -> SlicerResult<Vec<NodePath>> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|&i| slots[i]);
    for (expected, &i) in order.iter().enumerate() {
        if slots[i] != expected {
            return Err(SlicerError::malformed(format!(
                "filter levels are not a contiguous prefix (found level {} at position {})",
                slots[i], expected
            )));
        }
    }

    rows.map(|row| {
        if row.len() != slots.len() {
            return Err(SlicerError::malformed(format!(
                "tuple has {} values for {} targets",
                row.len(),
                slots.len()
            )));
        }
        let segments = order
            .iter()
            .map(|&i| format_level(row[i].clone(), slots[i], levels))
            .collect::<SlicerResult<Vec<_>>>()?;
        Ok(NodePath::new(segments))
    })
    .collect()
}

fn format_level(
    value: PrimitiveValue,
    level: usize,
    levels: &[ColumnMetadata],
) -> SlicerResult<String> {
    let column = levels
        .get(level)
        .ok_or_else(|| SlicerError::malformed(format!("level {} is not bound", level)))?;
    let typed = value.retype(&column.column_type, level)?;
    Ok(format_value(&typed, column.format.as_deref()))
}
