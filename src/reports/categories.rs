//! Site search categories
//!
//! Search categories are tracked as a reserved custom variable. Its values
//! live in the sub-table of the variable's row, so each site/period answer
//! is located in the custom variable report first and then re-fetched by
//! sub-table id, pinned to that entry's period.

use super::{datasets, ReportQuery};
use crate::archive::{fetch_recorded, ArchiveGateway, QueryCoordinates};
use crate::error::{Error, Result};
use crate::table::{ReportData, ReportTable};
use crate::types::{DateSelector, Period, SubtableId};
use futures::future::try_join_all;
use tracing::{debug, warn};

/// Fetch category values for every site/period entry of the query
///
/// The answer has the same shape and key order as the custom variable
/// report. Entries where the variable was never recorded hold an empty
/// table carrying the entry's metadata.
pub(crate) async fn assemble<G>(gateway: &G, query: &ReportQuery, variable: &str) -> Result<ReportData>
where
    G: ArchiveGateway + ?Sized,
{
    let coords = query.top_level_coordinates(datasets::CUSTOM_VARIABLES);
    let variables = fetch_recorded(gateway, &coords).await?;

    match variables {
        ReportData::Single(table) => {
            let categories = match locate(&table, variable) {
                Some(subtable_id) => {
                    fetch_recorded(gateway, &coords.with_subtable(subtable_id)).await?
                }
                None => ReportData::Single(table.empty_clone()),
            };
            Ok(categories)
        }
        ReportData::Multi(collection) => {
            let mut output = collection.empty_clone();
            let coords = &coords;
            let lookups = collection.iter().map(|(key, entry)| async move {
                let categories = entry_categories(gateway, coords, entry, variable).await?;
                Ok::<_, Error>((key.to_string(), categories))
            });

            for (key, categories) in try_join_all(lookups).await? {
                output.insert(key, categories);
            }
            Ok(ReportData::Multi(output))
        }
        ReportData::Scalar(value) => Err(Error::UnsupportedShape(format!(
            "custom variable report is a scalar value {}",
            value
        ))),
    }
}

async fn entry_categories<G>(
    gateway: &G,
    coords: &QueryCoordinates,
    entry: &ReportData,
    variable: &str,
) -> Result<ReportData>
where
    G: ArchiveGateway + ?Sized,
{
    let table = match entry {
        ReportData::Single(table) => table,
        other => {
            debug!("Skipping {} entry in custom variable report", other.shape());
            return Ok(ReportData::Single(ReportTable::new()));
        }
    };

    let (Some(period), Some(subtable_id)) = (table.metadata().period, locate(table, variable)) else {
        return Ok(ReportData::Single(table.empty_clone()));
    };

    let date = match period.granularity {
        Period::Range => period.as_date_range(),
        _ => DateSelector::Date(period.start),
    };
    fetch_recorded(gateway, &coords.with_subtable(subtable_id).with_date(date)).await
}

/// Sub-table id of the variable's row
fn locate(table: &ReportTable, variable: &str) -> Option<SubtableId> {
    let row = table.row_from_label(variable)?;
    if row.subtable_id().is_none() {
        warn!("Custom variable '{}' has no values table", variable);
    }
    row.subtable_id()
}
