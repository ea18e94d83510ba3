//! Report rows and metric values

use super::ReportTable;
use crate::types::SubtableId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Row metadata key holding the raw page URL
pub const METADATA_URL: &str = "url";

/// Row metadata key holding the decoded URL used for segment filtering
pub const METADATA_SEGMENT_VALUE: &str = "segmentValue";

/// A single metric cell
///
/// Archives store most metrics as numbers, but some columns can hold an empty
/// string, which is not the same as zero (the entry/exit filters drop blanks
/// and keep zeros).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric value
    Number(f64),
    /// Text value, possibly empty
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value; numeric text is parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// True for the empty string
    pub fn is_blank(&self) -> bool {
        matches!(self, MetricValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Number(value as f64)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Number(value as f64)
    }
}

impl From<i32> for MetricValue {
    fn from(value: i32) -> Self {
        MetricValue::Number(f64::from(value))
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

/// Reference to a row's child table
///
/// The id is always present; the table itself is only materialized when the
/// archive was fetched expanded. Unloaded children are fetched through the
/// gateway with the same coordinates plus this id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtableRef {
    /// Archive identifier of the child table
    pub id: SubtableId,
    /// Child table when already loaded
    pub loaded: Option<Box<ReportTable>>,
}

/// One row of a report table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Row label (URL segment, page title segment, keyword, ...)
    pub label: String,
    /// Metric id or name -> value
    pub columns: BTreeMap<String, MetricValue>,
    /// Free-form metadata (url, segmentValue, ...)
    pub metadata: BTreeMap<String, Value>,
    /// Optional child table
    pub subtable: Option<SubtableRef>,
}

impl Row {
    /// Create a row with the given label and no columns
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Builder: set a column
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Builder: set a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builder: reference an unloaded child table
    pub fn with_subtable(mut self, id: SubtableId) -> Self {
        self.subtable = Some(SubtableRef { id, loaded: None });
        self
    }

    /// Builder: attach a loaded child table
    pub fn with_loaded_subtable(mut self, id: SubtableId, table: ReportTable) -> Self {
        self.subtable = Some(SubtableRef {
            id,
            loaded: Some(Box::new(table)),
        });
        self
    }

    /// Get a column value
    pub fn column(&self, name: &str) -> Option<&MetricValue> {
        self.columns.get(name)
    }

    /// Get a column as a number
    pub fn column_f64(&self, name: &str) -> Option<f64> {
        self.columns.get(name).and_then(MetricValue::as_f64)
    }

    /// Set a column value
    pub fn set_column(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.columns.insert(name.into(), value.into());
    }

    /// Remove a column, returning its value
    pub fn delete_column(&mut self, name: &str) -> Option<MetricValue> {
        self.columns.remove(name)
    }

    /// Get a metadata value
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Set a metadata value
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Child table id, loaded or not
    pub fn subtable_id(&self) -> Option<SubtableId> {
        self.subtable.as_ref().map(|s| s.id)
    }

    /// Child table if it is loaded
    pub fn loaded_subtable(&self) -> Option<&ReportTable> {
        self.subtable.as_ref().and_then(|s| s.loaded.as_deref())
    }

    /// Mutable child table if it is loaded
    pub fn loaded_subtable_mut(&mut self) -> Option<&mut ReportTable> {
        self.subtable.as_mut().and_then(|s| s.loaded.as_deref_mut())
    }

    /// Add another row's columns into this one
    ///
    /// Numeric cells are summed; a blank cell counts as zero when the other
    /// side is numeric. Columns missing here are copied over. Any other
    /// combination keeps this row's value.
    pub fn sum_columns(&mut self, other: &Row) {
        for (name, value) in &other.columns {
            match self.columns.get_mut(name) {
                None => {
                    self.columns.insert(name.clone(), value.clone());
                }
                Some(existing) => match (existing.as_f64(), value.as_f64()) {
                    (Some(a), Some(b)) => *existing = MetricValue::Number(a + b),
                    (None, Some(b)) if existing.is_blank() => *existing = MetricValue::Number(b),
                    _ => {}
                },
            }
        }
    }

    /// Copy metadata entries this row does not have yet
    pub fn merge_metadata(&mut self, other: &Row) {
        for (key, value) in &other.metadata {
            self.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
