//! Host filter model and the selection ↔ filter conversions.

pub mod deserialize;
pub mod model;
pub mod serialize;

pub use deserialize::{from_condition, selected_paths, selected_paths_or_empty};
pub use model::{
    AdvancedCondition, AdvancedFilter, BasicFilter, BasicOperator, Condition, ConditionArg,
    ConditionOperator, Filter, FilterInstruction, FilterTarget, LogicalOperator, PersistKey,
    PersistedState, TupleElement, TupleFilter, TupleOperator, EXPANDED_KEY, FILTER_KEY,
    FILTER_VALUES_KEY, SELF_FILTER_KEY,
};
pub use serialize::{filter_depth, serialize_search, serialize_selection};
