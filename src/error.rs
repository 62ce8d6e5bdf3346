//! Slicer error types.

use thiserror::Error;

/// Errors raised while building the tree or translating filters.
///
/// Entry points (`convert`, `SlicerSession` handlers) catch these, log them,
/// and degrade to an empty result instead of surfacing them to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlicerError {
    /// The matrix has no bound levels or no root children.
    #[error("Empty dataset: the matrix has no levels or no rows")]
    EmptyDataset,

    /// No table/column could be resolved for a hierarchy level.
    #[error("Missing filter target: level {level} ('{column}') has no resolvable table/column")]
    MissingFilterTarget {
        /// Level index in the column metadata.
        level: usize,
        /// Display name of the column.
        column: String,
    },

    /// A value could not be turned into a filter constant.
    #[error("Unsupported data type at level {level}: {found}")]
    UnsupportedDataType {
        /// Level index the value belongs to.
        level: usize,
        /// Description of the offending value.
        found: String,
    },

    /// Filter structure is empty or references unknown levels.
    #[error("Malformed filter: {reason}")]
    MalformedFilter {
        /// What was wrong with it.
        reason: String,
    },

    /// An identifier string could not be decoded.
    #[error("Invalid identifier '{input}': {reason}")]
    InvalidIdentifier {
        /// The offending input.
        input: String,
        /// Why decoding failed.
        reason: String,
    },

    /// Settings could not be parsed.
    #[error("Invalid configuration: {reason}")]
    Config {
        /// Parser message.
        reason: String,
    },
}

impl SlicerError {
    /// Stable error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::MissingFilterTarget { .. } => "MISSING_FILTER_TARGET",
            Self::UnsupportedDataType { .. } => "UNSUPPORTED_DATA_TYPE",
            Self::MalformedFilter { .. } => "MALFORMED_FILTER",
            Self::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            Self::Config { .. } => "CONFIG",
        }
    }

    /// Shorthand for a `MalformedFilter` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFilter {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type SlicerResult<T> = Result<T, SlicerError>;
