//! Hierarchy Slicer - matrix-to-tree projection with round-tripped filters.
//!
//! The host hands over a matrix result (nested level values plus column
//! metadata) and whatever filter it persisted last time. This crate:
//! - builds a flat, pre-order tree of selectable nodes (`tree`)
//! - restores and maintains selection, partial selection and visibility
//!   (`selection`, `session`)
//! - turns the selection back into a host filter (`filter`)
//!
//! # Architecture
//!
//! ```text
//! HostUpdate ──► converter::convert ──► SlicerData ──► SlicerSession
//!    │                 │                                   │
//!    │                 ├── TreeBuilder (matrix → nodes)    ├── click / clear
//!    │                 ├── filter::selected_paths          ├── toggle_expand
//!    │                 └── selection passes                └── search
//!    │                                                         │
//!    └──────────────── FilterInstruction ◄─────────────────────┘
//! ```
//!
//! Node identity is the path of formatted level values (`NodePath`), encoded
//! as `[seg],[seg]#` for persistence. Older `seg_seg` identifiers still
//! decode.
//!
//! # Example
//!
//! ```
//! use hierarchy_slicer::{HostUpdate, MatrixResult, NodePath, SlicerSession, SlicerSettings};
//! use hierarchy_slicer::value::{ColumnMetadata, ColumnType};
//! use serde_json::json;
//!
//! let matrix = MatrixResult::from_rows(
//!     vec![
//!         ColumnMetadata::new("Year", ColumnType::integer()).with_query_name("Dates.Year"),
//!         ColumnMetadata::new("Quarter", ColumnType::text()).with_query_name("Dates.Quarter"),
//!     ],
//!     &[
//!         vec![json!(2018), json!("Qtr 1")],
//!         vec![json!(2018), json!("Qtr 2")],
//!     ],
//! );
//!
//! let settings = SlicerSettings::default().with_single_select(false);
//! let mut session = SlicerSession::from_update(&HostUpdate::new(matrix), settings).unwrap();
//! let instruction = session.click(&NodePath::from(["2018", "Qtr 1"])).unwrap();
//! assert!(!instruction.is_remove());
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod filter;
pub mod format;
pub mod identity;
pub mod matrix;
pub mod selection;
pub mod session;
pub mod tree;
pub mod value;

// Re-exports
pub use config::{HideMembers, SearchMode, SlicerSettings};
pub use converter::{convert, try_convert, HostUpdate, SlicerData};
pub use error::{SlicerError, SlicerResult};
pub use filter::{Filter, FilterInstruction, FilterTarget, PersistedState};
pub use identity::NodePath;
pub use matrix::{MatrixNode, MatrixResult};
pub use session::SlicerSession;
pub use tree::{NodeKind, SlicerNode};
pub use value::{ColumnMetadata, ColumnType, PrimitiveValue};
