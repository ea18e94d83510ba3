//! Report normalization pipeline
//!
//! Every report goes through the same base sequence before it is returned:
//!
//! 1. rename storage metric ids to public names
//! 2. stable descending sort on the visit column (into loaded sub-tables when expanded)
//! 3. decode `url` metadata into `segmentValue`
//! 4. group rows whose decoded labels collide, re-sorting tables that merged
//! 5. queue the summary-row relabel
//!
//! Sub-report variants compose policies on top of it (entry-only, exit-only,
//! followed-by-search, no-result search, pages per search). Queued filters
//! run in [`ReportNormalizer::finish`].

use super::columns::metric_ids;
use super::{RowCondition, SortKey, SortOrder, TableFilter};
use crate::config::ReportsConfig;
use crate::table::ReportData;
use tracing::debug;

/// Public name of the pages-per-search column
pub const COLUMN_PAGES_PER_SEARCH: &str = "nb_pages_per_search";

/// Applies the base pipeline and the sub-report policies
#[derive(Debug, Clone)]
pub struct ReportNormalizer {
    sort_column: String,
    others_label: String,
    pages_per_search_precision: u32,
}

impl Default for ReportNormalizer {
    fn default() -> Self {
        Self::new(&ReportsConfig::default())
    }
}

impl ReportNormalizer {
    /// Create a normalizer from report settings
    pub fn new(config: &ReportsConfig) -> Self {
        Self {
            sort_column: config.sort_column.clone(),
            others_label: config.others_label.clone(),
            pages_per_search_precision: config.pages_per_search_precision,
        }
    }

    /// Base pipeline: eager steps now, summary relabel queued
    pub fn normalize(&self, data: &mut ReportData, expanded: bool) {
        debug!(
            "Normalizing {} report (expanded={}, rows={})",
            data.shape(),
            expanded,
            data.row_count()
        );

        data.filter(&TableFilter::ReplaceColumnNames);
        data.filter(&TableFilter::Sort {
            column: self.sort_column.clone(),
            order: SortOrder::Desc,
            recursive: expanded,
        });
        data.filter(&TableFilter::AddSegmentValue);
        data.filter(&TableFilter::GroupByDecodedLabel {
            resort: Some(SortKey::desc(self.sort_column.clone())),
        });
        data.queue_filter(TableFilter::ReplaceSummaryRowLabel {
            label: self.others_label.clone(),
        });
    }

    /// Queue the derived page metrics (time on page, bounce and exit rates)
    pub fn queue_page_metrics(&self, data: &mut ReportData) {
        data.queue_filter(TableFilter::DeleteColumns(vec!["bounce_rate".to_string()]));
        data.queue_filter(TableFilter::AddColumnQuotient {
            target: "avg_time_on_page".to_string(),
            numerator: "sum_time_spent".to_string(),
            denominator: "nb_visits".to_string(),
            precision: 0,
        });
        data.queue_filter(TableFilter::AddColumnPercentage {
            target: "bounce_rate".to_string(),
            numerator: "entry_bounce_count".to_string(),
            denominator: "entry_nb_visits".to_string(),
            precision: 0,
        });
        data.queue_filter(TableFilter::AddColumnPercentage {
            target: "exit_rate".to_string(),
            numerator: "exit_nb_visits".to_string(),
            denominator: "nb_visits".to_string(),
            precision: 0,
        });
    }

    /// Drop rows that never started a visit (blank entry visits; zero is kept)
    pub fn keep_entry_rows(&self, data: &mut ReportData) {
        data.filter(&TableFilter::DeleteRowsWhere {
            column: "entry_nb_visits".to_string(),
            condition: RowCondition::Blank,
        });
    }

    /// Drop rows that never ended a visit (blank exit visits; zero is kept)
    pub fn keep_exit_rows(&self, data: &mut ReportData) {
        data.filter(&TableFilter::DeleteRowsWhere {
            column: "exit_nb_visits".to_string(),
            condition: RowCondition::Blank,
        });
    }

    /// Keep only pages hit right after a site search
    pub fn keep_rows_following_search(&self, data: &mut ReportData) {
        data.filter(&TableFilter::DeleteRowsWhere {
            column: "nb_hits_following_search".to_string(),
            condition: RowCondition::AtMost(0.0),
        });
    }

    /// Keep only keywords flagged as returning no result
    ///
    /// Works on the raw flag column, so it must run before renaming. The
    /// summary row and the flag column are dropped.
    pub fn keep_no_result_searches(&self, data: &mut ReportData) {
        data.filter(&TableFilter::DeleteRowsWhere {
            column: metric_ids::SITE_SEARCH_HAS_NO_RESULT.to_string(),
            condition: RowCondition::Below(1.0),
        });
        data.filter(&TableFilter::DeleteSummaryRow);
        self.drop_no_result_flag(data);
    }

    /// Remove the raw has-no-result flag column
    pub fn drop_no_result_flag(&self, data: &mut ReportData) {
        data.filter(&TableFilter::DeleteColumns(vec![
            metric_ids::SITE_SEARCH_HAS_NO_RESULT.to_string(),
        ]));
    }

    /// Queue `nb_pages_per_search = hits_column / nb_visits`
    pub fn queue_pages_per_search(&self, data: &mut ReportData, hits_column: &str) {
        data.queue_filter(TableFilter::AddColumnQuotient {
            target: COLUMN_PAGES_PER_SEARCH.to_string(),
            numerator: hits_column.to_string(),
            denominator: self.sort_column.clone(),
            precision: self.pages_per_search_precision,
        });
    }

    /// Flush queued filters; the report is final afterwards
    pub fn finish(&self, data: &mut ReportData) {
        data.apply_queued_filters();
    }
}
