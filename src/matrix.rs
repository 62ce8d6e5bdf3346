//! Host matrix input.
//!
//! The host hands over a matrix result: one column descriptor per bound
//! hierarchy level and a nested tree of row nodes. Each node carries its
//! level value, optional children, and an opaque identity token the host
//! uses for its own selection plumbing.
//!
//! ```text
//! MatrixResult
//! ├── levels: [Year, Quarter, Month]
//! └── root
//!     └── children: Vec<MatrixNode>
//!         ├── 2018
//!         │   ├── Qtr 1
//!         │   └── Qtr 2
//!         └── 2019
//! ```

use serde::{Deserialize, Serialize};

use crate::value::ColumnMetadata;

/// Opaque per-node handle owned by the host. Never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(pub serde_json::Value);

/// A node of the host matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixNode {
    /// Level value as sent by the host (typed later from column metadata).
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MatrixNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityToken>,
}

impl MatrixNode {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            children: Vec::new(),
            identity: None,
        }
    }

    /// Builder: add a child.
    pub fn with_child(mut self, child: MatrixNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: set children.
    pub fn with_children(mut self, children: Vec<MatrixNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder: attach the host identity token.
    pub fn with_identity(mut self, identity: serde_json::Value) -> Self {
        self.identity = Some(IdentityToken(identity));
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Root of the matrix: levels plus top-level rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixResult {
    #[serde(default)]
    pub levels: Vec<ColumnMetadata>,
    #[serde(default)]
    pub rows: Vec<MatrixNode>,
}

impl MatrixResult {
    pub fn new(levels: Vec<ColumnMetadata>, rows: Vec<MatrixNode>) -> Self {
        Self { levels, rows }
    }

    /// No bound levels or no rows.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() || self.rows.is_empty()
    }

    /// Build a matrix from flat rows of level values, merging shared
    /// prefixes. Rows shorter than the level count stop early.
    pub fn from_rows(levels: Vec<ColumnMetadata>, rows: &[Vec<serde_json::Value>]) -> Self {
        let mut roots: Vec<MatrixNode> = Vec::new();
        for row in rows {
            let mut siblings = &mut roots;
            for value in row.iter().take(levels.len()) {
                let index = match siblings.iter().position(|n| &n.value == value) {
                    Some(i) => i,
                    None => {
                        siblings.push(MatrixNode::new(value.clone()));
                        siblings.len() - 1
                    }
                };
                siblings = &mut siblings[index].children;
            }
        }
        Self {
            levels,
            rows: roots,
        }
    }
}
