//! Filter wire shapes exchanged with the host.
//!
//! ```text
//! Filter (tagged by "$schema")
//! ├── Tuple     target: [FilterTarget; N], values: [[{value}; N]]   (primary)
//! ├── Basic     target: FilterTarget,      values: [value]          (legacy)
//! └── Advanced  target: FilterTarget,      conditions: [{operator, value}]
//!
//! Condition (fallback "where" / legacy condition trees)
//! ├── And { left, right }
//! ├── Or  { left, right }
//! ├── Compare { arg, value }          arg = level reference
//! └── In { args, values }             one value row per selected tuple
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SlicerError, SlicerResult};
use crate::value::{ColumnMetadata, PrimitiveValue};

pub const TUPLE_FILTER_TYPE: u8 = 6;
pub const BASIC_FILTER_TYPE: u8 = 1;
pub const ADVANCED_FILTER_TYPE: u8 = 0;

// ============================================================================
// TARGETS
// ============================================================================

/// Column or hierarchy level a filter slot applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterTarget {
    #[serde(rename_all = "camelCase")]
    HierarchyLevel {
        table: String,
        hierarchy: String,
        hierarchy_level: String,
    },
    Column { table: String, column: String },
}

impl FilterTarget {
    /// Resolve the target for one bound level.
    ///
    /// Uses the explicit source when present, otherwise the query name
    /// (`Table.Column` or `Table.Hierarchy.Level`).
    pub fn for_column(column: &ColumnMetadata, level: usize) -> SlicerResult<Self> {
        let missing = || SlicerError::MissingFilterTarget {
            level,
            column: column.display_name.clone(),
        };

        if let Some(source) = &column.source {
            if source.table.is_empty() {
                return Err(missing());
            }
            return match (&source.hierarchy, &source.hierarchy_level, &source.column) {
                (Some(hierarchy), Some(hierarchy_level), _) => Ok(Self::HierarchyLevel {
                    table: source.table.clone(),
                    hierarchy: hierarchy.clone(),
                    hierarchy_level: hierarchy_level.clone(),
                }),
                (_, _, Some(name)) => Ok(Self::Column {
                    table: source.table.clone(),
                    column: name.clone(),
                }),
                _ => Err(missing()),
            };
        }

        let query_name = column.query_name.as_deref().ok_or_else(missing)?;
        let parts: Vec<&str> = query_name.splitn(3, '.').collect();
        match parts.as_slice() {
            [table, name] if !table.is_empty() && !name.is_empty() => Ok(Self::Column {
                table: table.to_string(),
                column: name.to_string(),
            }),
            [table, hierarchy, hierarchy_level] if !table.is_empty() => Ok(Self::HierarchyLevel {
                table: table.to_string(),
                hierarchy: hierarchy.to_string(),
                hierarchy_level: hierarchy_level.to_string(),
            }),
            _ => Err(missing()),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::HierarchyLevel { table, .. } | Self::Column { table, .. } => table,
        }
    }

    pub fn is_hierarchy_level(&self) -> bool {
        matches!(self, Self::HierarchyLevel { .. })
    }

    /// Level index this target refers to, if any bound level matches.
    pub fn resolve_level(&self, levels: &[ColumnMetadata]) -> Option<usize> {
        levels.iter().position(|c| match self {
            Self::Column { table, column } => {
                let by_source = c
                    .source
                    .as_ref()
                    .map(|s| &s.table == table && s.column.as_ref() == Some(column))
                    .unwrap_or(false);
                let qualified = format!("{}.{}", table, column);
                let by_query = c.query_name.as_deref() == Some(qualified.as_str());
                by_source || by_query || (c.source.is_none() && &c.display_name == column)
            }
            Self::HierarchyLevel {
                hierarchy_level, ..
            } => c.level_name() == hierarchy_level.as_str() || &c.display_name == hierarchy_level,
        })
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// One cell of a tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleElement {
    pub value: PrimitiveValue,
}

impl From<PrimitiveValue> for TupleElement {
    fn from(value: PrimitiveValue) -> Self {
        Self { value }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TupleOperator {
    #[default]
    In,
}

/// Set membership over one or more ordered columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleFilter {
    pub target: Vec<FilterTarget>,
    #[serde(default)]
    pub operator: TupleOperator,
    #[serde(default)]
    pub values: Vec<Vec<TupleElement>>,
    #[serde(default = "tuple_filter_type")]
    pub filter_type: u8,
}

fn tuple_filter_type() -> u8 {
    TUPLE_FILTER_TYPE
}

impl TupleFilter {
    pub fn new(target: Vec<FilterTarget>, values: Vec<Vec<TupleElement>>) -> Self {
        Self {
            target,
            operator: TupleOperator::In,
            values,
            filter_type: TUPLE_FILTER_TYPE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicOperator {
    #[default]
    In,
    NotIn,
    All,
}

/// Single-column membership (pre-tuple persisted state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicFilter {
    pub target: FilterTarget,
    #[serde(default)]
    pub operator: BasicOperator,
    #[serde(default)]
    pub values: Vec<PrimitiveValue>,
    #[serde(default = "basic_filter_type")]
    pub filter_type: u8,
}

fn basic_filter_type() -> u8 {
    BASIC_FILTER_TYPE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    StartsWith,
    DoesNotStartWith,
    IsBlank,
    IsNotBlank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedCondition {
    pub operator: ConditionOperator,
    #[serde(default = "null_value")]
    pub value: PrimitiveValue,
}

fn null_value() -> PrimitiveValue {
    PrimitiveValue::Null
}

/// Single-column condition list joined by one logical operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilter {
    pub target: FilterTarget,
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<AdvancedCondition>,
    #[serde(default = "advanced_filter_type")]
    pub filter_type: u8,
}

fn advanced_filter_type() -> u8 {
    ADVANCED_FILTER_TYPE
}

impl AdvancedFilter {
    pub fn new(
        target: FilterTarget,
        logical_operator: LogicalOperator,
        conditions: Vec<AdvancedCondition>,
    ) -> Self {
        Self {
            target,
            logical_operator,
            conditions,
            filter_type: ADVANCED_FILTER_TYPE,
        }
    }
}

/// Any filter the host may hand back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$schema")]
pub enum Filter {
    #[serde(rename = "http://powerbi.com/product/schema#tuple")]
    Tuple(TupleFilter),
    #[serde(rename = "http://powerbi.com/product/schema#basic")]
    Basic(BasicFilter),
    #[serde(rename = "http://powerbi.com/product/schema#advanced")]
    Advanced(AdvancedFilter),
}

// ============================================================================
// CONDITION TREES
// ============================================================================

/// Reference to a hierarchy level inside a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

impl ConditionArg {
    /// Level index this argument refers to.
    pub fn resolve(&self, levels: &[ColumnMetadata]) -> SlicerResult<usize> {
        let by_level = self.level.as_deref().and_then(|name| {
            levels
                .iter()
                .position(|c| c.level_name() == name || c.display_name == name)
        });
        let by_ref = || {
            self.ref_name.as_deref().and_then(|name| {
                levels.iter().position(|c| {
                    c.display_name == name
                        || c.query_name.as_deref() == Some(name)
                        || c
                            .query_name
                            .as_deref()
                            .and_then(|q| q.rsplit('.').next())
                            == Some(name)
                })
            })
        };
        by_level.or_else(by_ref).ok_or_else(|| {
            SlicerError::malformed(format!(
                "condition references unknown level (level: {:?}, ref: {:?})",
                self.level, self.ref_name
            ))
        })
    }
}

/// Boolean condition tree over hierarchy levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    And {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    Or {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    Compare {
        arg: ConditionArg,
        value: PrimitiveValue,
    },
    In {
        args: Vec<ConditionArg>,
        values: Vec<Vec<PrimitiveValue>>,
    },
}

impl Condition {
    pub fn and(left: Condition, right: Condition) -> Self {
        Self::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Condition, right: Condition) -> Self {
        Self::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(arg: ConditionArg, value: PrimitiveValue) -> Self {
        Self::Compare { arg, value }
    }
}

// ============================================================================
// HOST INSTRUCTIONS
// ============================================================================

/// Object/property pair the host persists a value under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistKey {
    pub object_name: &'static str,
    pub property_name: &'static str,
}

/// Selection filter.
pub const FILTER_KEY: PersistKey = PersistKey {
    object_name: "general",
    property_name: "filter",
};

/// Fallback where-condition stored next to hierarchy tuple filters.
pub const FILTER_VALUES_KEY: PersistKey = PersistKey {
    object_name: "general",
    property_name: "filterValues",
};

/// Expanded-paths string.
pub const EXPANDED_KEY: PersistKey = PersistKey {
    object_name: "general",
    property_name: "expanded",
};

/// Search self-filter.
pub const SELF_FILTER_KEY: PersistKey = PersistKey {
    object_name: "general",
    property_name: "selfFilter",
};

/// What the host should do with the filter slot after an interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FilterInstruction {
    Merge {
        key: PersistKey,
        filter: Filter,
        #[serde(skip_serializing_if = "Option::is_none")]
        where_condition: Option<Condition>,
    },
    Remove {
        key: PersistKey,
    },
}

impl FilterInstruction {
    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }

    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Self::Merge { filter, .. } => Some(filter),
            Self::Remove { .. } => None,
        }
    }
}

/// Selection state the host hands back on each update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub filter: Option<Filter>,
    /// Fallback where-condition (see `FILTER_VALUES_KEY`).
    pub where_condition: Option<Condition>,
    /// Comma-joined legacy identifiers from pre-filter versions.
    pub legacy_selection: Option<String>,
}

impl PersistedState {
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.where_condition.is_none()
            && self
                .legacy_selection
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true)
    }
}
