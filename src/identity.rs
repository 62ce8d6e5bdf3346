//! Node paths and the identifier codec.
//!
//! A node is identified by its path: the formatted value of every level from
//! the topmost ancestor down to the node itself. Paths are persisted as
//! strings in two formats:
//!
//! ```text
//! new:     [2018],[Qtr 1]#      segments bracketed, ']' and '\' escaped,
//!                               terminated by '#'
//! legacy:  2018_Qtr 1           segments joined by '_', no escaping
//! ```
//!
//! The legacy format cannot represent values containing the delimiter (and
//! legacy selection lists were comma-joined, so commas broke them too). It is
//! only ever decoded; `encode` always produces the new format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{SlicerError, SlicerResult};

const SEGMENT_OPEN: char = '[';
const SEGMENT_CLOSE: char = ']';
const SEGMENT_SEPARATOR: char = ',';
const TERMINATOR: char = '#';
const ESCAPE: char = '\\';

/// Delimiter between segments in legacy identifiers.
pub const LEGACY_DELIMITER: char = '_';

/// Delimiter between identifiers in legacy lists.
pub const LEGACY_LIST_DELIMITER: char = ',';

/// Path segment of the synthetic "select all" node.
pub const SELECT_ALL_SEGMENT: &str = "selectAll";

// ============================================================================
// NODE PATH
// ============================================================================

/// Ordered level values identifying a node from the root down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(pub Vec<String>);

impl NodePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// The empty path (parent of every root-level node).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the synthetic "select all" node.
    pub fn select_all() -> Self {
        Self(vec![SELECT_ALL_SEGMENT.to_string()])
    }

    /// Create a child path by appending a segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Parent path, or `None` for the root path.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The first `len` segments (the whole path if it is shorter).
    pub fn truncated(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for NodePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for NodePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NodePath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

// ============================================================================
// SINGLE IDENTIFIERS
// ============================================================================

/// Encode a path in the new format.
pub fn encode(path: &NodePath) -> String {
    let mut out = String::new();
    for (i, segment) in path.0.iter().enumerate() {
        if i > 0 {
            out.push(SEGMENT_SEPARATOR);
        }
        out.push(SEGMENT_OPEN);
        for c in segment.chars() {
            if c == SEGMENT_CLOSE || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
        out.push(SEGMENT_CLOSE);
    }
    out.push(TERMINATOR);
    out
}

/// Whether `s` is in the new format (judged by its sentinels).
pub fn is_new_format(s: &str) -> bool {
    s == "#" || (s.starts_with(SEGMENT_OPEN) && s.ends_with(TERMINATOR))
}

/// Decode an identifier in either format.
pub fn decode(s: &str) -> SlicerResult<NodePath> {
    if !is_new_format(s) {
        return Ok(decode_legacy(s));
    }

    let mut chars = s.chars().peekable();
    let path = parse_new(&mut chars, s)?;
    if chars.next().is_some() {
        return Err(invalid(s, "trailing characters after terminator"));
    }
    Ok(path)
}

/// Decode a legacy identifier by splitting on the legacy delimiter.
pub fn decode_legacy(s: &str) -> NodePath {
    if s.is_empty() {
        return NodePath::root();
    }
    NodePath(s.split(LEGACY_DELIMITER).map(str::to_string).collect())
}

fn parse_new(chars: &mut Peekable<Chars<'_>>, input: &str) -> SlicerResult<NodePath> {
    let mut segments = Vec::new();

    if chars.peek() == Some(&TERMINATOR) {
        chars.next();
        return Ok(NodePath(segments));
    }

    loop {
        match chars.next() {
            Some(SEGMENT_OPEN) => {}
            _ => return Err(invalid(input, "expected '[' at segment start")),
        }

        let mut segment = String::new();
        loop {
            match chars.next() {
                Some(ESCAPE) => match chars.next() {
                    Some(c) => segment.push(c),
                    None => return Err(invalid(input, "dangling escape")),
                },
                Some(SEGMENT_CLOSE) => break,
                Some(c) => segment.push(c),
                None => return Err(invalid(input, "unterminated segment")),
            }
        }
        segments.push(segment);

        match chars.next() {
            Some(SEGMENT_SEPARATOR) => continue,
            Some(TERMINATOR) => return Ok(NodePath(segments)),
            _ => return Err(invalid(input, "expected ',' or '#' after segment")),
        }
    }
}

fn invalid(input: &str, reason: &str) -> SlicerError {
    SlicerError::InvalidIdentifier {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// LISTS (expanded paths, legacy selections)
// ============================================================================

/// Encode a list of paths. New-format identifiers are self-delimiting, so
/// the list is just the identifiers joined by ','.
pub fn encode_list(paths: &[NodePath]) -> String {
    paths
        .iter()
        .map(encode)
        .collect::<Vec<_>>()
        .join(&SEGMENT_SEPARATOR.to_string())
}

/// Decode a list of paths in either format.
///
/// Lists whose first identifier is in the new format are scanned
/// identifier-by-identifier; anything else is treated as a legacy
/// comma-joined list.
pub fn decode_list(s: &str) -> SlicerResult<Vec<NodePath>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if !(trimmed.starts_with(SEGMENT_OPEN) || trimmed.starts_with(TERMINATOR)) {
        return Ok(decode_legacy_list(trimmed));
    }

    let mut chars = trimmed.chars().peekable();
    let mut paths = Vec::new();
    loop {
        paths.push(parse_new(&mut chars, trimmed)?);
        match chars.next() {
            None => return Ok(paths),
            Some(SEGMENT_SEPARATOR) => continue,
            Some(_) => return Err(invalid(trimmed, "expected ',' between identifiers")),
        }
    }
}

/// Decode a legacy comma-joined list of legacy identifiers.
pub fn decode_legacy_list(s: &str) -> Vec<NodePath> {
    s.split(LEGACY_LIST_DELIMITER)
        .filter(|piece| !piece.is_empty())
        .map(decode_legacy)
        .collect()
}
