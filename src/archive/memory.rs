//! In-memory archive
//!
//! Fixture-backed gateway. Reports are registered per dataset and sub-table
//! id, either for one specific date selector or for any date. Every fetch
//! hands out a clone and is recorded for later inspection.

use super::{ArchiveGateway, QueryCoordinates};
use crate::error::GatewayError;
use crate::table::ReportData;
use crate::types::{DateSelector, SubtableId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ArchiveKey {
    dataset: String,
    date: Option<DateSelector>,
    subtable_id: Option<SubtableId>,
}

/// Simple in-memory archive
#[derive(Default)]
pub struct InMemoryArchive {
    reports: HashMap<ArchiveKey, ReportData>,
    failures: HashMap<String, GatewayError>,
    requests: Mutex<Vec<QueryCoordinates>>,
}

impl InMemoryArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a report served for any date
    pub fn insert(
        &mut self,
        dataset: impl Into<String>,
        subtable_id: Option<SubtableId>,
        data: impl Into<ReportData>,
    ) {
        let key = ArchiveKey {
            dataset: dataset.into(),
            date: None,
            subtable_id,
        };
        self.reports.insert(key, data.into());
    }

    /// Register a report served for one date selector only
    pub fn insert_for_date(
        &mut self,
        dataset: impl Into<String>,
        date: DateSelector,
        subtable_id: Option<SubtableId>,
        data: impl Into<ReportData>,
    ) {
        let key = ArchiveKey {
            dataset: dataset.into(),
            date: Some(date),
            subtable_id,
        };
        self.reports.insert(key, data.into());
    }

    /// Make every fetch of a dataset fail
    pub fn fail_dataset(&mut self, dataset: impl Into<String>, error: GatewayError) {
        self.failures.insert(dataset.into(), error);
    }

    /// Coordinates of every fetch so far, in order
    pub fn requests(&self) -> Vec<QueryCoordinates> {
        self.requests.lock().clone()
    }

    /// Number of fetches so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn lookup(&self, coords: &QueryCoordinates) -> Option<&ReportData> {
        let dated = ArchiveKey {
            dataset: coords.dataset().to_string(),
            date: Some(coords.date()),
            subtable_id: coords.subtable_id(),
        };
        self.reports.get(&dated).or_else(|| {
            let any_date = ArchiveKey { date: None, ..dated };
            self.reports.get(&any_date)
        })
    }
}

#[async_trait]
impl ArchiveGateway for InMemoryArchive {
    async fn fetch(&self, coords: &QueryCoordinates) -> Result<ReportData, GatewayError> {
        self.requests.lock().push(coords.clone());

        if let Some(error) = self.failures.get(coords.dataset()) {
            return Err(error.clone());
        }

        self.lookup(coords)
            .cloned()
            .ok_or_else(|| GatewayError::NotArchived {
                dataset: coords.dataset().to_string(),
                detail: format!(
                    "date={} subtable={:?}",
                    coords.date(),
                    coords.subtable_id()
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ReportTable, Row};
    use crate::types::{Period, SiteSelector};
    use chrono::NaiveDate;

    fn coords(date: DateSelector) -> QueryCoordinates {
        QueryCoordinates::new("Actions_actions", SiteSelector::Single(1), Period::Day, date)
    }

    #[tokio::test]
    async fn test_dated_entry_wins_over_any_date() {
        let day = DateSelector::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let mut archive = InMemoryArchive::new();
        archive.insert("Actions_actions", None, ReportTable::from_rows(vec![Row::new("any")]));
        archive.insert_for_date(
            "Actions_actions",
            day,
            None,
            ReportTable::from_rows(vec![Row::new("dated")]),
        );

        let dated = archive.fetch(&coords(day)).await.unwrap();
        assert_eq!(dated.as_table().unwrap().rows()[0].label, "dated");

        let other = archive.fetch(&coords(DateSelector::Last(2))).await.unwrap();
        assert_eq!(other.as_table().unwrap().rows()[0].label, "any");
        assert_eq!(archive.request_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_failing_datasets() {
        let mut archive = InMemoryArchive::new();
        let missing = archive.fetch(&coords(DateSelector::Last(1))).await;
        assert!(matches!(missing, Err(GatewayError::NotArchived { .. })));

        archive.fail_dataset("Actions_actions", GatewayError::AccessDenied("site 1".into()));
        let denied = archive.fetch(&coords(DateSelector::Last(1))).await;
        assert_eq!(denied, Err(GatewayError::AccessDenied("site 1".into())));
    }
}
