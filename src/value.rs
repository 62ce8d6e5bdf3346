//! Typed level values and column metadata.
//!
//! Host values arrive as untyped JSON. Each level's column metadata says
//! whether the column is text, numeric, boolean, or date; `PrimitiveValue`
//! is the typed result used for raggedness checks, labels, and filter
//! constants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SlicerError, SlicerResult};

/// Wire format for date constants.
pub const DATE_WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ============================================================================
// PRIMITIVE VALUE
// ============================================================================

/// A typed level value. Only these kinds can become filter constants.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl PrimitiveValue {
    /// Convert a host value using the level's column type.
    ///
    /// Arrays and objects are rejected with `UnsupportedDataType`.
    pub fn from_host(
        value: &serde_json::Value,
        column_type: &ColumnType,
        level: usize,
    ) -> SlicerResult<Self> {
        use serde_json::Value;

        let kind = column_type.kind();
        let typed = match value {
            Value::Null => PrimitiveValue::Null,
            Value::Bool(b) => PrimitiveValue::Boolean(*b),
            Value::Number(n) => {
                let number = n.as_f64().ok_or_else(|| SlicerError::UnsupportedDataType {
                    level,
                    found: format!("number {}", n),
                })?;
                match kind {
                    ValueKind::DateTime => DateTime::<Utc>::from_timestamp_millis(number as i64)
                        .map(|d| PrimitiveValue::Date(d.naive_utc()))
                        .unwrap_or(PrimitiveValue::Number(number)),
                    _ => PrimitiveValue::Number(number),
                }
            }
            Value::String(s) => match kind {
                ValueKind::DateTime => parse_date(s)
                    .map(PrimitiveValue::Date)
                    .unwrap_or_else(|| PrimitiveValue::Text(s.clone())),
                ValueKind::Numeric => s
                    .trim()
                    .parse::<f64>()
                    .map(PrimitiveValue::Number)
                    .unwrap_or_else(|_| PrimitiveValue::Text(s.clone())),
                ValueKind::Boolean => match s.to_ascii_lowercase().as_str() {
                    "true" => PrimitiveValue::Boolean(true),
                    "false" => PrimitiveValue::Boolean(false),
                    _ => PrimitiveValue::Text(s.clone()),
                },
                ValueKind::Text => PrimitiveValue::Text(s.clone()),
            },
            Value::Array(_) => {
                return Err(SlicerError::UnsupportedDataType {
                    level,
                    found: "array".to_string(),
                })
            }
            Value::Object(_) => {
                return Err(SlicerError::UnsupportedDataType {
                    level,
                    found: "object".to_string(),
                })
            }
        };
        Ok(typed)
    }

    /// Null or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            PrimitiveValue::Null => true,
            PrimitiveValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// JSON form used on the wire.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PrimitiveValue::Null => serde_json::Value::Null,
            PrimitiveValue::Text(s) => serde_json::Value::String(s.clone()),
            PrimitiveValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PrimitiveValue::Boolean(b) => serde_json::Value::Bool(*b),
            PrimitiveValue::Date(d) => {
                serde_json::Value::String(d.format(DATE_WIRE_FORMAT).to_string())
            }
        }
    }

    /// Parse a wire value without column information.
    ///
    /// Dates come back as text; callers re-type them with `retype`.
    pub fn from_json(value: &serde_json::Value) -> SlicerResult<Self> {
        Self::from_host(value, &ColumnType::default(), 0)
    }

    /// Re-interpret an untyped wire value for a specific column.
    pub fn retype(self, column_type: &ColumnType, level: usize) -> SlicerResult<Self> {
        match self {
            PrimitiveValue::Date(_) => Ok(self),
            other => Self::from_host(&other.to_json(), column_type, level),
        }
    }
}

impl Serialize for PrimitiveValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PrimitiveValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        PrimitiveValue::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Parse the date shapes hosts commonly send.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ============================================================================
// COLUMN METADATA
// ============================================================================

/// Value kind derived from a column's type flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Numeric,
    Boolean,
    DateTime,
}

/// Host type descriptor (flag-style, as the host reports it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnType {
    pub text: bool,
    pub numeric: bool,
    pub integer: bool,
    pub date_time: bool,
    pub bool: bool,
}

impl ColumnType {
    pub fn text() -> Self {
        Self {
            text: true,
            ..Self::default()
        }
    }

    pub fn numeric() -> Self {
        Self {
            numeric: true,
            ..Self::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            numeric: true,
            integer: true,
            ..Self::default()
        }
    }

    pub fn date_time() -> Self {
        Self {
            date_time: true,
            ..Self::default()
        }
    }

    pub fn boolean() -> Self {
        Self {
            bool: true,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ValueKind {
        if self.date_time {
            ValueKind::DateTime
        } else if self.numeric || self.integer {
            ValueKind::Numeric
        } else if self.bool {
            ValueKind::Boolean
        } else {
            ValueKind::Text
        }
    }
}

/// Explicit filter source for a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSource {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<String>,
}

/// One bound hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub display_name: String,
    /// Host query reference, e.g. `Sales.Year`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    /// Host format string, e.g. `dd/MM/yyyy` or `#,0.00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ColumnSource>,
}

impl ColumnMetadata {
    pub fn new(display_name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            display_name: display_name.into(),
            query_name: None,
            format: None,
            column_type,
            source: None,
        }
    }

    /// Builder: set the query reference.
    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }

    /// Builder: set the format string.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Builder: set an explicit filter source.
    pub fn with_source(mut self, source: ColumnSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Name a hierarchy-level reference is matched against.
    pub fn level_name(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.hierarchy_level.as_deref().or(s.column.as_deref()))
            .unwrap_or(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_host_by_kind() {
        assert_eq!(
            PrimitiveValue::from_host(&json!("42.5"), &ColumnType::numeric(), 0).unwrap(),
            PrimitiveValue::Number(42.5)
        );
        assert_eq!(
            PrimitiveValue::from_host(&json!("abc"), &ColumnType::numeric(), 0).unwrap(),
            PrimitiveValue::Text("abc".into())
        );
        assert_eq!(
            PrimitiveValue::from_host(&json!(null), &ColumnType::text(), 0).unwrap(),
            PrimitiveValue::Null
        );
        assert_eq!(
            PrimitiveValue::from_host(&json!("TRUE"), &ColumnType::boolean(), 0).unwrap(),
            PrimitiveValue::Boolean(true)
        );
    }

    #[test]
    fn test_from_host_dates() {
        let expected = NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for input in [
            json!("2018-03-01"),
            json!("2018-03-01T00:00:00"),
            json!("2018-03-01T00:00:00.000Z"),
            json!(1_519_862_400_000i64),
        ] {
            assert_eq!(
                PrimitiveValue::from_host(&input, &ColumnType::date_time(), 0).unwrap(),
                PrimitiveValue::Date(expected),
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_unsupported_types() {
        let err = PrimitiveValue::from_host(&json!([1, 2]), &ColumnType::text(), 3).unwrap_err();
        assert_eq!(
            err,
            SlicerError::UnsupportedDataType {
                level: 3,
                found: "array".into()
            }
        );
        assert!(PrimitiveValue::from_host(&json!({"a": 1}), &ColumnType::text(), 0).is_err());
    }

    #[test]
    fn test_date_wire_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2019, 12, 31)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        let value = PrimitiveValue::Date(date);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#""2019-12-31T13:05:00.000Z""#);

        let untyped: PrimitiveValue = serde_json::from_str(&json).unwrap();
        assert_eq!(
            untyped.retype(&ColumnType::date_time(), 0).unwrap(),
            value
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(PrimitiveValue::Null.is_empty());
        assert!(PrimitiveValue::Text(String::new()).is_empty());
        assert!(!PrimitiveValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_level_name_prefers_source() {
        let column = ColumnMetadata::new("Year", ColumnType::integer()).with_source(ColumnSource {
            table: "Dates".into(),
            column: None,
            hierarchy: Some("Calendar".into()),
            hierarchy_level: Some("Calendar Year".into()),
        });
        assert_eq!(column.level_name(), "Calendar Year");
        assert_eq!(
            ColumnMetadata::new("Region", ColumnType::text()).level_name(),
            "Region"
        );
    }
}
