//! Row sorting
//!
//! Sorting is stable: rows comparing equal keep their relative order. The
//! comparator is not a natural sort. Numbers (and numeric text) compare by
//! value and rank above non-numeric text, which compares byte-wise. Rows
//! missing the sort column always go last. The summary row is stored apart
//! and is never moved.

use super::{for_each_loaded_subtable, SortOrder};
use crate::table::{MetricValue, ReportTable};
use std::cmp::Ordering;

/// Compare two cells for the given order
pub fn compare_values(a: Option<&MetricValue>, b: Option<&MetricValue>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let cmp = compare_present(a, b);
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_present(a: &MetricValue, b: &MetricValue) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}

pub(crate) fn sort_table(table: &mut ReportTable, column: &str, order: SortOrder, recursive: bool) {
    table
        .rows_mut()
        .sort_by(|a, b| compare_values(a.column(column), b.column(column), order));

    if recursive {
        for_each_loaded_subtable(table, |sub| sort_table(sub, column, order, recursive));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    fn labels(table: &ReportTable) -> Vec<String> {
        table.all_rows().map(|r| r.label.clone()).collect()
    }

    #[test]
    fn test_descending_is_stable() {
        let mut table = ReportTable::from_rows(vec![
            Row::new("a").with_column("nb_visits", 1),
            Row::new("b").with_column("nb_visits", 5),
            Row::new("c").with_column("nb_visits", 1),
            Row::new("d").with_column("nb_visits", 5),
            Row::new("e"),
        ])
        .with_summary_row(Row::new("x").with_column("nb_visits", 100));

        sort_table(&mut table, "nb_visits", SortOrder::Desc, false);
        assert_eq!(labels(&table), vec!["b", "d", "a", "c", "e", "-1"]);
    }

    #[test]
    fn test_text_is_not_natural_sorted() {
        let mut table = ReportTable::from_rows(vec![
            Row::new("a").with_column("name", "item10"),
            Row::new("b").with_column("name", "item9"),
            Row::new("c").with_column("name", "item100"),
        ]);
        sort_table(&mut table, "name", SortOrder::Asc, false);
        assert_eq!(labels(&table), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_numbers_rank_above_text() {
        assert_eq!(
            compare_values(
                Some(&MetricValue::from(1)),
                Some(&MetricValue::from("n/a")),
                SortOrder::Desc
            ),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&MetricValue::from("")), None, SortOrder::Asc),
            Ordering::Less
        );
    }

    #[test]
    fn test_recursive_sort() {
        let child = ReportTable::from_rows(vec![
            Row::new("/low").with_column("nb_visits", 1),
            Row::new("/high").with_column("nb_visits", 9),
        ]);
        let mut table =
            ReportTable::from_rows(vec![Row::new("dir").with_loaded_subtable(1, child.clone())]);

        sort_table(&mut table, "nb_visits", SortOrder::Desc, false);
        assert_eq!(
            labels(table.rows()[0].loaded_subtable().unwrap()),
            vec!["/low", "/high"]
        );

        sort_table(&mut table, "nb_visits", SortOrder::Desc, true);
        assert_eq!(
            labels(table.rows()[0].loaded_subtable().unwrap()),
            vec!["/high", "/low"]
        );
    }
}
