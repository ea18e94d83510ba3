//! Archive query gateway
//!
//! The aggregation store that computes and persists per-period rollups lives
//! behind [`ArchiveGateway`]. This crate only reads from it: every table is
//! fetched by value using [`QueryCoordinates`], including the child tables
//! that path descent loads on demand.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryArchive`]: fixture-backed store for tests and embedding
//! - [`CachedGateway`]: LRU/TTL decorator over any other gateway

pub mod cached;
pub mod memory;

pub use cached::{CacheStats, CachedGateway};
pub use memory::InMemoryArchive;

use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::table::ReportData;
use crate::types::{DateSelector, Period, SiteSelector, SubtableId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Source of archived reports
#[async_trait]
pub trait ArchiveGateway: Send + Sync {
    /// Fetch the report stored under the given coordinates
    async fn fetch(&self, coords: &QueryCoordinates) -> std::result::Result<ReportData, GatewayError>;
}

/// Immutable address of an archived report
///
/// Path descent derives new coordinates from old ones (another sub-table,
/// a pinned period) and never mutates them in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryCoordinates {
    dataset: String,
    site: SiteSelector,
    period: Period,
    date: DateSelector,
    segment: Option<String>,
    expanded: bool,
    subtable_id: Option<SubtableId>,
    depth: Option<u32>,
}

impl QueryCoordinates {
    /// Coordinates of a top-level, unexpanded, unsegmented report
    pub fn new(dataset: impl Into<String>, site: SiteSelector, period: Period, date: DateSelector) -> Self {
        Self {
            dataset: dataset.into(),
            site,
            period,
            date,
            segment: None,
            expanded: false,
            subtable_id: None,
            depth: None,
        }
    }

    /// Same coordinates with a segment filter
    pub fn with_segment(mut self, segment: Option<String>) -> Self {
        self.segment = segment.filter(|s| !s.is_empty());
        self
    }

    /// Same coordinates, expanded or not
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Same coordinates with a depth limit for expanded fetches
    pub fn with_depth(mut self, depth: Option<u32>) -> Self {
        self.depth = depth;
        self
    }

    /// Same coordinates pointing at a child table
    pub fn with_subtable(&self, subtable_id: SubtableId) -> Self {
        Self {
            subtable_id: Some(subtable_id),
            ..self.clone()
        }
    }

    /// Same coordinates with an optional child table
    pub fn with_optional_subtable(mut self, subtable_id: Option<SubtableId>) -> Self {
        self.subtable_id = subtable_id;
        self
    }

    /// Same coordinates for another date
    pub fn with_date(&self, date: DateSelector) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }

    /// Same coordinates against another dataset
    pub fn with_dataset(&self, dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..self.clone()
        }
    }

    /// Dataset name
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Site selector
    pub fn site(&self) -> &SiteSelector {
        &self.site
    }

    /// Period granularity
    pub fn period(&self) -> Period {
        self.period
    }

    /// Date selector
    pub fn date(&self) -> DateSelector {
        self.date
    }

    /// Segment filter
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// Expanded fetch flag
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// Child table id
    pub fn subtable_id(&self) -> Option<SubtableId> {
        self.subtable_id
    }

    /// Depth limit
    pub fn depth(&self) -> Option<u32> {
        self.depth
    }
}

/// Fetch through a gateway, recording latency and outcome
pub async fn fetch_recorded<G>(gateway: &G, coords: &QueryCoordinates) -> Result<ReportData>
where
    G: ArchiveGateway + ?Sized,
{
    let start = Instant::now();
    let result = gateway.fetch(coords).await;
    let elapsed = start.elapsed();

    metrics::record_fetch(coords.dataset(), elapsed.as_secs_f64(), result.is_ok());
    debug!(
        "Fetched {} (site={}, period={}, date={}, subtable={:?}) in {:?}",
        coords.dataset(),
        coords.site(),
        coords.period(),
        coords.date(),
        coords.subtable_id(),
        elapsed
    );

    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn coords() -> QueryCoordinates {
        QueryCoordinates::new(
            "Actions_actions_url",
            SiteSelector::Single(1),
            Period::Day,
            DateSelector::Last(3),
        )
    }

    #[test]
    fn test_derivation_does_not_mutate() {
        let base = coords().with_segment(Some("browserCode==FF".to_string()));
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let child = base.with_subtable(7).with_date(DateSelector::Date(day));

        assert_eq!(base.subtable_id(), None);
        assert_eq!(base.date(), DateSelector::Last(3));
        assert_eq!(child.subtable_id(), Some(7));
        assert_eq!(child.date(), DateSelector::Date(day));
        assert_eq!(child.segment(), Some("browserCode==FF"));
        assert_eq!(child.dataset(), base.dataset());
    }

    #[test]
    fn test_empty_segment_is_none() {
        assert_eq!(coords().with_segment(Some(String::new())).segment(), None);
    }
}
