//! Row deletion filters

use super::{for_each_loaded_subtable, RowCondition};
use crate::table::ReportTable;

pub(crate) fn delete_rows_where(table: &mut ReportTable, column: &str, condition: RowCondition) {
    table.retain_rows(|row| !condition.matches(row.column(column)));
    for_each_loaded_subtable(table, |sub| delete_rows_where(sub, column, condition));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn test_entry_filter_literal_cases() {
        let mut table = ReportTable::from_rows(vec![
            Row::new("blank").with_column("entry_nb_visits", ""),
            Row::new("zero").with_column("entry_nb_visits", 0),
            Row::new("three").with_column("entry_nb_visits", 3),
            Row::new("absent"),
        ]);

        delete_rows_where(&mut table, "entry_nb_visits", RowCondition::Blank);

        let labels: Vec<&str> = table.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["zero", "three"]);
    }

    #[test]
    fn test_delete_reaches_children_and_summary() {
        let child = ReportTable::from_rows(vec![
            Row::new("/kept").with_column("nb_hits_following_search", 2),
            Row::new("/gone").with_column("nb_hits_following_search", 0),
        ]);
        let mut table = ReportTable::from_rows(vec![Row::new("dir")
            .with_column("nb_hits_following_search", 2)
            .with_loaded_subtable(4, child)])
        .with_summary_row(Row::new("").with_column("nb_hits_following_search", 0));

        delete_rows_where(
            &mut table,
            "nb_hits_following_search",
            RowCondition::AtMost(0.0),
        );

        assert!(table.summary_row().is_none());
        let child = table.rows()[0].loaded_subtable().unwrap();
        assert_eq!(child.rows().len(), 1);
        assert_eq!(child.rows()[0].label, "/kept");
    }
}
