//! Report data model
//!
//! - [`Row`]: label, metric columns, metadata, optional child reference
//! - [`ReportTable`]: ordered rows, summary row, table metadata, queued filters
//! - [`PeriodCollection`]: ordered key -> report map for multi-period/multi-site answers
//! - [`ReportData`]: what an archive hands back, as an explicit tagged variant

pub mod collection;
pub mod report;
pub mod row;

pub use collection::{PeriodCollection, KEY_DATE, KEY_SITE};
pub use report::{ReportTable, TableMetadata, SUMMARY_ROW_LABEL};
pub use row::{MetricValue, Row, SubtableRef, METADATA_SEGMENT_VALUE, METADATA_URL};

use crate::pipeline::TableFilter;
use serde::{Deserialize, Serialize};

/// Result of an archive fetch or of a report operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportData {
    /// One table (single site, single period)
    Single(ReportTable),
    /// One entry per period or site; entries may nest
    Multi(PeriodCollection),
    /// A bare numeric record; not searchable
    Scalar(MetricValue),
}

impl ReportData {
    /// Short name of the variant, for logs and errors
    pub fn shape(&self) -> &'static str {
        match self {
            ReportData::Single(_) => "table",
            ReportData::Multi(_) => "collection",
            ReportData::Scalar(_) => "scalar",
        }
    }

    /// Borrow as a single table
    pub fn as_table(&self) -> Option<&ReportTable> {
        match self {
            ReportData::Single(table) => Some(table),
            _ => None,
        }
    }

    /// Consume into a single table
    pub fn into_table(self) -> Option<ReportTable> {
        match self {
            ReportData::Single(table) => Some(table),
            _ => None,
        }
    }

    /// Borrow as a collection
    pub fn as_collection(&self) -> Option<&PeriodCollection> {
        match self {
            ReportData::Multi(collection) => Some(collection),
            _ => None,
        }
    }

    /// Total rows over every table
    pub fn row_count(&self) -> usize {
        match self {
            ReportData::Single(table) => table.row_count(),
            ReportData::Multi(collection) => {
                collection.iter().map(|(_, data)| data.row_count()).sum()
            }
            ReportData::Scalar(_) => 0,
        }
    }

    /// Visit every table, descending into nested collections
    pub fn for_each_table_mut(&mut self, f: &mut dyn FnMut(&mut ReportTable)) {
        match self {
            ReportData::Single(table) => f(table),
            ReportData::Multi(collection) => {
                for (_, data) in collection.iter_mut() {
                    data.for_each_table_mut(f);
                }
            }
            ReportData::Scalar(_) => {}
        }
    }

    /// Apply a filter to every table now
    pub fn filter(&mut self, filter: &TableFilter) {
        self.for_each_table_mut(&mut |table| table.filter(filter));
    }

    /// Queue a filter on every table
    pub fn queue_filter(&mut self, filter: TableFilter) {
        self.for_each_table_mut(&mut |table| table.queue_filter(filter.clone()));
    }

    /// Flush queued filters on every table
    pub fn apply_queued_filters(&mut self) {
        self.for_each_table_mut(&mut |table| table.apply_queued_filters());
    }
}

impl From<ReportTable> for ReportData {
    fn from(table: ReportTable) -> Self {
        ReportData::Single(table)
    }
}

impl From<PeriodCollection> for ReportData {
    fn from(collection: PeriodCollection) -> Self {
        ReportData::Multi(collection)
    }
}
