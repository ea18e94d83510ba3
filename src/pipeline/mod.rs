//! Report filter pipeline
//!
//! Filters are plain values. A table applies them either eagerly
//! ([`ReportTable::filter`]) or defers them ([`ReportTable::queue_filter`]) until
//! the report is handed back, where [`ReportTable::apply_queued_filters`]
//! flushes the queue once, in order.
//!
//! Unless noted otherwise, filters recurse into loaded sub-tables and see the
//! summary row.

pub mod columns;
pub mod labels;
pub mod normalize;
pub mod rows;
pub mod sort;

pub use columns::{metric_ids, metric_name};
pub use labels::decode_label;
pub use normalize::ReportNormalizer;
pub use sort::compare_values;

use crate::table::{MetricValue, ReportTable};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

/// Column and direction of a sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Column to sort on
    pub column: String,
    /// Direction
    pub order: SortOrder,
}

impl SortKey {
    /// Descending sort on a column
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Row deletion predicate over one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowCondition {
    /// Column absent or the empty string; zero is not blank
    Blank,
    /// Numeric value (non-numeric counts as 0) is at most the bound
    AtMost(f64),
    /// Numeric value (non-numeric counts as 0) is below the bound
    Below(f64),
}

impl RowCondition {
    /// True when a row with this cell must be deleted
    pub fn matches(&self, value: Option<&MetricValue>) -> bool {
        match self {
            RowCondition::Blank => value.map_or(true, MetricValue::is_blank),
            RowCondition::AtMost(bound) => numeric_or_zero(value) <= *bound,
            RowCondition::Below(bound) => numeric_or_zero(value) < *bound,
        }
    }
}

fn numeric_or_zero(value: Option<&MetricValue>) -> f64 {
    value.and_then(MetricValue::as_f64).unwrap_or(0.0)
}

/// A table transformation
#[derive(Debug, Clone, PartialEq)]
pub enum TableFilter {
    /// Rename storage metric ids to public metric names
    ReplaceColumnNames,
    /// Stable sort on one column; `recursive` also sorts loaded sub-tables
    Sort {
        /// Column to sort on
        column: String,
        /// Direction
        order: SortOrder,
        /// Descend into loaded sub-tables
        recursive: bool,
    },
    /// Store the decoded `url` metadata as `segmentValue`
    AddSegmentValue,
    /// Merge rows whose decoded labels are equal
    ///
    /// Labels are decoded once per table. Tables whose rows merged are
    /// sorted again by `resort`.
    GroupByDecodedLabel {
        /// Stable sort reapplied after a merge
        resort: Option<SortKey>,
    },
    /// Give the summary row its public label
    ReplaceSummaryRowLabel {
        /// Public label, e.g. "Others"
        label: String,
    },
    /// Delete rows whose cell matches the condition
    DeleteRowsWhere {
        /// Column to test
        column: String,
        /// Deletion predicate
        condition: RowCondition,
    },
    /// Drop the summary row (top level only)
    DeleteSummaryRow,
    /// Remove columns from every row
    DeleteColumns(Vec<String>),
    /// `target = numerator / denominator`, 0 when the denominator is 0
    AddColumnQuotient {
        /// Column to write
        target: String,
        /// Dividend column
        numerator: String,
        /// Divisor column
        denominator: String,
        /// Decimal places kept
        precision: u32,
    },
    /// `target = numerator / denominator * 100`, 0 when the denominator is 0
    AddColumnPercentage {
        /// Column to write
        target: String,
        /// Dividend column
        numerator: String,
        /// Divisor column
        denominator: String,
        /// Decimal places kept
        precision: u32,
    },
}

impl TableFilter {
    /// Apply this filter to a table
    pub fn apply(&self, table: &mut ReportTable) {
        match self {
            TableFilter::ReplaceColumnNames => columns::replace_column_names(table),
            TableFilter::Sort {
                column,
                order,
                recursive,
            } => sort::sort_table(table, column, *order, *recursive),
            TableFilter::AddSegmentValue => labels::add_segment_value(table),
            TableFilter::GroupByDecodedLabel { resort } => {
                labels::group_by_decoded_label(table, resort.as_ref())
            }
            TableFilter::ReplaceSummaryRowLabel { label } => {
                labels::replace_summary_row_label(table, label)
            }
            TableFilter::DeleteRowsWhere { column, condition } => {
                rows::delete_rows_where(table, column, *condition)
            }
            TableFilter::DeleteSummaryRow => {
                table.delete_summary_row();
            }
            TableFilter::DeleteColumns(names) => columns::delete_columns(table, names),
            TableFilter::AddColumnQuotient {
                target,
                numerator,
                denominator,
                precision,
            } => columns::add_column_ratio(table, target, numerator, denominator, *precision, 1.0),
            TableFilter::AddColumnPercentage {
                target,
                numerator,
                denominator,
                precision,
            } => {
                columns::add_column_ratio(table, target, numerator, denominator, *precision, 100.0)
            }
        }
    }
}

/// Visit every loaded sub-table of a table's rows (summary row included)
pub(crate) fn for_each_loaded_subtable(table: &mut ReportTable, mut f: impl FnMut(&mut ReportTable)) {
    for row in table.all_rows_mut() {
        if let Some(subtable) = row.loaded_subtable_mut() {
            f(subtable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn test_blank_condition() {
        let cond = RowCondition::Blank;
        assert!(cond.matches(None));
        assert!(cond.matches(Some(&MetricValue::from(""))));
        assert!(!cond.matches(Some(&MetricValue::from(0))));
        assert!(!cond.matches(Some(&MetricValue::from(3))));
    }

    #[test]
    fn test_numeric_conditions() {
        assert!(RowCondition::AtMost(0.0).matches(Some(&MetricValue::from(0))));
        assert!(RowCondition::AtMost(0.0).matches(None));
        assert!(!RowCondition::AtMost(0.0).matches(Some(&MetricValue::from(1))));
        assert!(RowCondition::Below(1.0).matches(Some(&MetricValue::from(0))));
        assert!(!RowCondition::Below(1.0).matches(Some(&MetricValue::from(1))));
    }

    #[test]
    fn test_queued_filters_run_in_order() {
        let mut table = ReportTable::from_rows(vec![Row::new("a").with_column("nb_visits", 2)]);
        table.queue_filter(TableFilter::DeleteColumns(vec!["nb_visits".to_string()]));
        table.queue_filter(TableFilter::AddColumnQuotient {
            target: "ratio".to_string(),
            numerator: "nb_hits".to_string(),
            denominator: "nb_visits".to_string(),
            precision: 1,
        });

        // Nothing happens until the flush
        assert_eq!(table.rows()[0].column_f64("nb_visits"), Some(2.0));

        table.apply_queued_filters();
        assert!(table.queued_filters().is_empty());
        assert!(table.rows()[0].column("nb_visits").is_none());
        assert_eq!(table.rows()[0].column_f64("ratio"), Some(0.0));
    }
}
