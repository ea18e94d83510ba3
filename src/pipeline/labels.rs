//! Label filters: decoding, grouping, summary-row relabeling

use super::sort::sort_table;
use super::{for_each_loaded_subtable, SortKey};
use crate::table::{ReportTable, Row, METADATA_SEGMENT_VALUE, METADATA_URL};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Percent-decode a label
///
/// `+` decodes to a space. Sequences that do not form valid UTF-8 are
/// replaced rather than rejected.
pub fn decode_label(label: &str) -> String {
    percent_decode(&label.replace('+', " "))
}

/// Percent-decode without touching `+`
pub(crate) fn percent_decode(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned(),
    }
}

pub(crate) fn add_segment_value(table: &mut ReportTable) {
    for row in table.all_rows_mut() {
        let decoded = match row.metadata(METADATA_URL) {
            Some(Value::String(url)) => decode_label(url),
            _ => continue,
        };
        row.set_metadata(METADATA_SEGMENT_VALUE, decoded);
    }
    for_each_loaded_subtable(table, add_segment_value);
}

/// Collapse rows whose decoded labels match into the first of them
///
/// Numeric columns are summed, metadata keeps the first row's values and
/// gains keys it lacked. When both rows carry loaded children, the second
/// child's rows are moved into the first and grouped again one level down.
///
/// A table is decoded once: afterwards it is marked `labels_decoded` and
/// only exact duplicates are merged. Any table whose rows merged, or whose
/// child received rows from a merged sibling, is sorted again by `resort`.
pub(crate) fn group_by_decoded_label(table: &mut ReportTable, resort: Option<&SortKey>) {
    group_level(table, resort, false);
}

fn group_level(table: &mut ReportTable, resort: Option<&SortKey>, received_rows: bool) {
    let decode = !table.metadata().labels_decoded;
    let rows = table.take_rows();
    let mut grouped: Vec<Row> = Vec::with_capacity(rows.len());
    let mut absorbed: Vec<bool> = Vec::with_capacity(rows.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut merged = false;

    for mut row in rows {
        let label = if decode {
            decode_label(&row.label)
        } else {
            row.label.clone()
        };
        match positions.get(&label) {
            Some(&index) => {
                merged = true;
                if merge_rows(&mut grouped[index], row) {
                    absorbed[index] = true;
                }
            }
            None => {
                positions.insert(label.clone(), grouped.len());
                row.label = label;
                grouped.push(row);
                absorbed.push(false);
            }
        }
    }

    for (row, received) in grouped.iter_mut().zip(absorbed) {
        if let Some(subtable) = row.loaded_subtable_mut() {
            group_level(subtable, resort, received);
        }
    }
    if let Some(subtable) = table.summary_row_mut().and_then(Row::loaded_subtable_mut) {
        group_level(subtable, resort, false);
    }

    *table.rows_mut() = grouped;
    table.metadata_mut().labels_decoded = true;

    if merged || received_rows {
        if let Some(key) = resort {
            sort_table(table, &key.column, key.order, false);
        }
    }
}

/// Fold `other` into `target`; true when rows moved into target's child
fn merge_rows(target: &mut Row, other: Row) -> bool {
    target.sum_columns(&other);
    target.merge_metadata(&other);

    let Some(theirs) = other.subtable else {
        return false;
    };
    let label = target.label.clone();
    let Some(mine) = target.subtable.as_mut() else {
        target.subtable = Some(theirs);
        return false;
    };

    if mine.loaded.is_none() {
        if theirs.loaded.is_some() {
            debug!(
                "Row '{}': adopting loaded sub-table {} in place of unloaded {}",
                label, theirs.id, mine.id
            );
            *mine = theirs;
        } else if mine.id != theirs.id {
            debug!("Row '{}': dropping unloaded sub-table {}, keeping {}", label, theirs.id, mine.id);
        }
        return false;
    }

    let their_id = theirs.id;
    match (mine.loaded.as_deref_mut(), theirs.loaded) {
        (Some(my_table), Some(their_table)) => {
            absorb_table(my_table, *their_table);
            true
        }
        _ => {
            debug!("Row '{}': dropping unloaded sub-table {}, keeping loaded {}", label, their_id, mine.id);
            false
        }
    }
}

fn absorb_table(into: &mut ReportTable, mut from: ReportTable) {
    let decode = into.metadata().labels_decoded && !from.metadata().labels_decoded;
    for mut row in from.take_rows() {
        if decode {
            row.label = decode_label(&row.label);
        }
        into.add_row(row);
    }
    if let Some(summary) = from.delete_summary_row() {
        match into.summary_row_mut() {
            Some(existing) => existing.sum_columns(&summary),
            None => into.set_summary_row(summary),
        }
    }
}

pub(crate) fn replace_summary_row_label(table: &mut ReportTable, label: &str) {
    if let Some(summary) = table.summary_row_mut() {
        summary.label = label.to_string();
    }
    for_each_loaded_subtable(table, |sub| replace_summary_row_label(sub, label));
}
