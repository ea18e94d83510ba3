//! Column filters: renaming, deletion, derived ratios

use super::for_each_loaded_subtable;
use crate::table::{MetricValue, ReportTable};

/// Storage metric ids as written by the archiver
pub mod metric_ids {
    /// Unique visitors
    pub const NB_UNIQ_VISITORS: &str = "1";
    /// Visits
    pub const NB_VISITS: &str = "2";
    /// Actions
    pub const NB_ACTIONS: &str = "3";
    /// Page hits
    pub const PAGE_NB_HITS: &str = "12";
    /// Time spent on page
    pub const PAGE_SUM_TIME_SPENT: &str = "13";
    /// Visits that ended on the page
    pub const PAGE_EXIT_NB_VISITS: &str = "15";
    /// Visits that started on the page
    pub const PAGE_ENTRY_NB_VISITS: &str = "19";
    /// Single-page visits that started on the page
    pub const PAGE_ENTRY_BOUNCE_COUNT: &str = "22";
    /// Site-search keyword returned no result (flag)
    pub const SITE_SEARCH_HAS_NO_RESULT: &str = "28";
    /// Page hits that directly followed a site search
    pub const PAGE_IS_FOLLOWING_SITE_SEARCH_NB_HITS: &str = "29";
}

/// Storage id -> public metric name
///
/// The site-search has-no-result flag is deliberately absent: reports drop it
/// before renaming.
const METRIC_NAMES: &[(&str, &str)] = &[
    ("1", "nb_uniq_visitors"),
    ("2", "nb_visits"),
    ("3", "nb_actions"),
    ("4", "max_actions"),
    ("5", "sum_visit_length"),
    ("6", "bounce_count"),
    ("7", "nb_visits_converted"),
    ("8", "nb_conversions"),
    ("9", "revenue"),
    ("10", "goals"),
    ("11", "sum_daily_nb_uniq_visitors"),
    ("12", "nb_hits"),
    ("13", "sum_time_spent"),
    ("14", "exit_nb_uniq_visitors"),
    ("15", "exit_nb_visits"),
    ("16", "sum_daily_exit_nb_uniq_visitors"),
    ("17", "entry_nb_uniq_visitors"),
    ("18", "sum_daily_entry_nb_uniq_visitors"),
    ("19", "entry_nb_visits"),
    ("20", "entry_nb_actions"),
    ("21", "entry_sum_visit_length"),
    ("22", "entry_bounce_count"),
    ("29", "nb_hits_following_search"),
];

/// Public name for a storage metric id
pub fn metric_name(id: &str) -> Option<&'static str> {
    METRIC_NAMES
        .iter()
        .find(|(metric_id, _)| *metric_id == id)
        .map(|(_, name)| *name)
}

pub(crate) fn replace_column_names(table: &mut ReportTable) {
    for row in table.all_rows_mut() {
        let columns = std::mem::take(&mut row.columns);
        row.columns = columns
            .into_iter()
            .map(|(id, value)| match metric_name(&id) {
                Some(name) => (name.to_string(), value),
                None => (id, value),
            })
            .collect();
    }
    for_each_loaded_subtable(table, replace_column_names);
}

pub(crate) fn delete_columns(table: &mut ReportTable, names: &[String]) {
    for row in table.all_rows_mut() {
        for name in names {
            row.delete_column(name);
        }
    }
    for_each_loaded_subtable(table, |sub| delete_columns(sub, names));
}

pub(crate) fn add_column_ratio(
    table: &mut ReportTable,
    target: &str,
    numerator: &str,
    denominator: &str,
    precision: u32,
    scale: f64,
) {
    for row in table.all_rows_mut() {
        let dividend = row.column_f64(numerator).unwrap_or(0.0);
        let divisor = row.column_f64(denominator).unwrap_or(0.0);
        let value = if divisor == 0.0 {
            0.0
        } else {
            round_to(dividend / divisor * scale, precision)
        };
        row.set_column(target, MetricValue::Number(value));
    }
    for_each_loaded_subtable(table, |sub| {
        add_column_ratio(sub, target, numerator, denominator, precision, scale)
    });
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
