//! Report tables
//!
//! A report table is an ordered list of rows plus table-level metadata and
//! at most one summary row. Insertion order is meaningful. The summary row is
//! kept apart from ordinary rows so it always iterates last, whatever the
//! order it was added in.
//!
//! Tables also own the queue of deferred filters: transformations that must
//! only run once, right before the table is handed to the caller.

use super::row::Row;
use crate::pipeline::TableFilter;
use crate::types::{PeriodSpan, SiteId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Internal label of the summary ("others") row
pub const SUMMARY_ROW_LABEL: &str = "-1";

/// Table-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Period this table was archived for
    pub period: Option<PeriodSpan>,
    /// Site this table belongs to
    pub site_id: Option<SiteId>,
    /// Dataset the table was read from
    pub dataset: Option<String>,
    /// Row labels are already percent-decoded
    #[serde(default)]
    pub labels_decoded: bool,
    /// Any other metadata
    pub extra: BTreeMap<String, Value>,
}

impl TableMetadata {
    /// Metadata for one period
    pub fn for_period(period: PeriodSpan) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }
}

/// Ordered table of report rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportTable {
    rows: Vec<Row>,
    summary_row: Option<Row>,
    metadata: TableMetadata,
    #[serde(skip)]
    queued_filters: Vec<TableFilter>,
}

impl ReportTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with metadata
    pub fn with_metadata(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Create a table holding exactly one row
    pub fn with_single_row(row: Row, metadata: TableMetadata) -> Self {
        Self {
            rows: vec![row],
            metadata,
            ..Default::default()
        }
    }

    /// Create a table from rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Builder: set the summary row
    pub fn with_summary_row(mut self, row: Row) -> Self {
        self.set_summary_row(row);
        self
    }

    /// Empty table carrying this table's metadata
    pub fn empty_clone(&self) -> Self {
        Self::with_metadata(self.metadata.clone())
    }

    /// Append a row
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Set the summary row, relabeling it with the reserved label
    pub fn set_summary_row(&mut self, mut row: Row) {
        row.label = SUMMARY_ROW_LABEL.to_string();
        self.summary_row = Some(row);
    }

    /// The summary row, if any
    pub fn summary_row(&self) -> Option<&Row> {
        self.summary_row.as_ref()
    }

    /// Mutable summary row
    pub fn summary_row_mut(&mut self) -> Option<&mut Row> {
        self.summary_row.as_mut()
    }

    /// Remove and return the summary row
    pub fn delete_summary_row(&mut self) -> Option<Row> {
        self.summary_row.take()
    }

    /// Ordinary rows in order (summary row excluded)
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable ordinary rows
    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Take all ordinary rows out of the table
    pub fn take_rows(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.rows)
    }

    /// Every row, summary row last
    pub fn all_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().chain(self.summary_row.iter())
    }

    /// Every row mutably, summary row last
    pub fn all_rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut().chain(self.summary_row.iter_mut())
    }

    /// Keep only rows (summary row included) matching the predicate
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(|row| keep(row));
        if self.summary_row.as_ref().is_some_and(|row| !keep(row)) {
            self.summary_row = None;
        }
    }

    /// Find a row by exact label
    ///
    /// The reserved summary label resolves to the summary row when no
    /// ordinary row carries it, even after the summary row was relabeled.
    pub fn row_from_label(&self, label: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.label == label).or_else(|| {
            self.summary_row
                .as_ref()
                .filter(|_| label == SUMMARY_ROW_LABEL)
        })
    }

    /// Number of rows including the summary row
    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.summary_row.is_some())
    }

    /// True when the table has no rows at all
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Table metadata
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Mutable table metadata
    pub fn metadata_mut(&mut self) -> &mut TableMetadata {
        &mut self.metadata
    }

    /// Replace table metadata
    pub fn set_metadata(&mut self, metadata: TableMetadata) {
        self.metadata = metadata;
    }

    /// Apply a filter now
    pub fn filter(&mut self, filter: &TableFilter) {
        filter.apply(self);
    }

    /// Defer a filter until `apply_queued_filters`
    pub fn queue_filter(&mut self, filter: TableFilter) {
        self.queued_filters.push(filter);
    }

    /// Filters waiting to be applied
    pub fn queued_filters(&self) -> &[TableFilter] {
        &self.queued_filters
    }

    /// Apply and clear queued filters, in the order they were queued
    pub fn apply_queued_filters(&mut self) {
        let queued = std::mem::take(&mut self.queued_filters);
        for filter in &queued {
            filter.apply(self);
        }
    }
}
