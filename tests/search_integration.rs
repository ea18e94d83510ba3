//! Path Search Integration Tests
//!
//! Exercises label path search end to end through the in-memory archive and
//! the caching gateway: multi-period fan-out, nested site/period answers,
//! period pinning on descent, and isolation between concurrent requests.

use chrono::NaiveDate;
use kuba_report_search::archive::{ArchiveGateway, CachedGateway, InMemoryArchive, QueryCoordinates};
use kuba_report_search::config::{CacheConfig, SearchConfig};
use kuba_report_search::error::{Error, GatewayError};
use kuba_report_search::search::{ActionKind, PathSearchEngine};
use kuba_report_search::table::{PeriodCollection, ReportData, ReportTable, Row, TableMetadata};
use kuba_report_search::types::{DateSelector, Period, PeriodSpan, SiteSelector};
use std::sync::Arc;

const DATASET: &str = "Actions_actions_url";

// =============================================================================
// Fixtures
// =============================================================================

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

fn coords(date: DateSelector) -> QueryCoordinates {
    QueryCoordinates::new(DATASET, SiteSelector::Single(1), Period::Day, date)
}

fn dated(mut table: ReportTable, d: u32) -> ReportTable {
    let mut metadata = TableMetadata::for_period(PeriodSpan::day(day(d)));
    metadata.site_id = Some(1);
    table.set_metadata(metadata);
    table
}

/// Root table for one day: `docs` folder -> sub-table `subtable`
fn root_for(d: u32, subtable: u64) -> ReportTable {
    dated(
        ReportTable::from_rows(vec![
            Row::new("/index").with_column("2", 30),
            Row::new("docs").with_column("2", 12).with_subtable(subtable),
        ]),
        d,
    )
}

fn docs_for(d: u32, visits: i64) -> ReportTable {
    dated(
        ReportTable::from_rows(vec![
            Row::new("guide").with_column("2", visits).with_subtable(100 + d as u64),
            Row::new("/faq").with_column("2", 1),
        ]),
        d,
    )
}

fn guide_for(d: u32, visits: i64) -> ReportTable {
    dated(
        ReportTable::from_rows(vec![Row::new("/install").with_column("2", visits)]),
        d,
    )
}

/// Three daily archives; day 2 has no `docs` folder at all
fn three_day_archive() -> InMemoryArchive {
    let mut archive = InMemoryArchive::new();

    let day_two = dated(
        ReportTable::from_rows(vec![Row::new("/index").with_column("2", 8)]),
        2,
    );
    let collection = PeriodCollection::by_date()
        .with_entry("2024-04-01", root_for(1, 11))
        .with_entry("2024-04-02", day_two)
        .with_entry("2024-04-03", root_for(3, 13));
    archive.insert(DATASET, None, collection);

    for d in [1u32, 3] {
        let pinned = PeriodSpan::day(day(d)).as_date_range();
        archive.insert_for_date(DATASET, pinned, Some(10 + d as u64), docs_for(d, 5 * d as i64));
        archive.insert_for_date(DATASET, pinned, Some(100 + d as u64), guide_for(d, d as i64));
    }
    archive
}

// =============================================================================
// Multi-Period Fan-Out
// =============================================================================

#[tokio::test]
async fn test_three_period_fan_out() {
    let archive = Arc::new(three_day_archive());
    let engine = PathSearchEngine::new(archive.clone(), &SearchConfig::default());

    let result = engine
        .search(&coords(DateSelector::Last(3)), &path(&["docs", "guide", "/install"]))
        .await
        .unwrap();

    let collection = result.as_collection().expect("collection answer");
    let keys: Vec<&str> = collection.keys().collect();
    assert_eq!(keys, vec!["2024-04-01", "2024-04-02", "2024-04-03"]);

    for (key, expected_visits) in [("2024-04-01", 1.0), ("2024-04-03", 3.0)] {
        let table = collection.get(key).unwrap().as_table().unwrap();
        assert_eq!(table.rows().len(), 1, "entry {}", key);
        assert_eq!(table.rows()[0].label, "/install");
        assert_eq!(table.rows()[0].column_f64("2"), Some(expected_visits));
    }

    let missing = collection.get("2024-04-02").unwrap().as_table().unwrap();
    assert!(missing.is_empty());
    assert_eq!(missing.metadata().period, Some(PeriodSpan::day(day(2))));
}

#[tokio::test]
async fn test_matched_row_keeps_period_metadata() {
    let archive = Arc::new(three_day_archive());
    let engine = PathSearchEngine::new(archive, &SearchConfig::default());

    let result = engine
        .search(&coords(DateSelector::Last(3)), &path(&["docs", "/faq"]))
        .await
        .unwrap();

    let collection = result.as_collection().unwrap();
    let first = collection.get("2024-04-01").unwrap().as_table().unwrap();
    assert_eq!(first.metadata().period, Some(PeriodSpan::day(day(1))));
    assert_eq!(first.metadata().site_id, Some(1));
}

#[tokio::test]
async fn test_descent_refetches_each_period_separately() {
    let archive = Arc::new(three_day_archive());
    let engine = PathSearchEngine::new(archive.clone(), &SearchConfig::default());

    engine
        .search(&coords(DateSelector::Last(3)), &path(&["docs", "guide", "/install"]))
        .await
        .unwrap();

    let mut child_dates: Vec<DateSelector> = archive
        .requests()
        .iter()
        .filter(|c| c.subtable_id().is_some())
        .map(|c| c.date())
        .collect();
    child_dates.sort_by_key(|d| d.to_string());
    child_dates.dedup();

    assert_eq!(
        child_dates,
        vec![
            PeriodSpan::day(day(1)).as_date_range(),
            PeriodSpan::day(day(3)).as_date_range(),
        ]
    );
}

#[tokio::test]
async fn test_first_segment_missing_everywhere() {
    let archive = Arc::new(three_day_archive());
    let engine = PathSearchEngine::new(archive.clone(), &SearchConfig::default());

    let result = engine
        .search(&coords(DateSelector::Last(3)), &path(&["shop", "/cart"]))
        .await
        .unwrap();

    assert_eq!(result.as_collection().unwrap().len(), 3);
    assert_eq!(result.row_count(), 0);
    assert_eq!(archive.request_count(), 1);
}

// =============================================================================
// Nested Collections (sites x days)
// =============================================================================

#[tokio::test]
async fn test_sites_by_day_first_match_per_site() {
    let mut archive = InMemoryArchive::new();

    // site 1: docs only exists on the second day; site 2: on both days
    let site_one = PeriodCollection::by_date()
        .with_entry("2024-04-01", dated(ReportTable::from_rows(vec![Row::new("/index")]), 1))
        .with_entry("2024-04-02", root_for(2, 22));
    let site_two = PeriodCollection::by_date()
        .with_entry("2024-04-01", root_for(1, 31))
        .with_entry("2024-04-02", root_for(2, 32));
    archive.insert(
        DATASET,
        None,
        PeriodCollection::by_site()
            .with_entry("1", site_one)
            .with_entry("2", site_two),
    );
    archive.insert_for_date(
        DATASET,
        PeriodSpan::day(day(2)).as_date_range(),
        Some(22),
        docs_for(2, 4),
    );
    archive.insert_for_date(
        DATASET,
        PeriodSpan::day(day(1)).as_date_range(),
        Some(31),
        docs_for(1, 6),
    );

    let archive = Arc::new(archive);
    let engine = PathSearchEngine::new(archive.clone(), &SearchConfig::default());
    let query = QueryCoordinates::new(
        DATASET,
        SiteSelector::Many(vec![1, 2]),
        Period::Day,
        DateSelector::Range {
            start: day(1),
            end: day(2),
        },
    );

    let result = engine.search(&query, &path(&["docs", "guide"])).await.unwrap();
    let sites = result.as_collection().unwrap();

    let one = sites.get("1").unwrap().as_table().unwrap();
    assert_eq!(one.rows()[0].column_f64("2"), Some(4.0));

    let two = sites.get("2").unwrap().as_table().unwrap();
    assert_eq!(two.rows()[0].column_f64("2"), Some(6.0));

    // site 2 stopped at its first day
    assert!(!archive.requests().iter().any(|c| c.subtable_id() == Some(32)));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_gateway_failure_is_not_swallowed() {
    let mut archive = three_day_archive();
    archive.fail_dataset(DATASET, GatewayError::Backend("archive offline".into()));
    let engine = PathSearchEngine::new(Arc::new(archive), &SearchConfig::default());

    let result = engine
        .search(&coords(DateSelector::Last(3)), &path(&["docs"]))
        .await;
    assert!(matches!(
        result,
        Err(Error::Gateway(GatewayError::Backend(_)))
    ));
}

#[tokio::test]
async fn test_scalar_entry_inside_collection_fails() {
    let mut archive = InMemoryArchive::new();
    archive.insert(
        DATASET,
        None,
        PeriodCollection::by_date()
            .with_entry("2024-04-01", root_for(1, 11))
            .with_entry("2024-04-02", ReportData::Scalar(7.into())),
    );
    let engine = PathSearchEngine::new(Arc::new(archive), &SearchConfig::default());

    let result = engine
        .search(&coords(DateSelector::Last(2)), &path(&["/index"]))
        .await;
    assert!(matches!(result, Err(Error::UnsupportedShape(_))));
}

// =============================================================================
// Caching Gateway
// =============================================================================

#[tokio::test]
async fn test_cached_gateway_serves_repeated_searches() {
    let cached = Arc::new(CachedGateway::new(three_day_archive(), &CacheConfig::default()).unwrap());
    let engine = PathSearchEngine::new(cached.clone(), &SearchConfig::default());
    let search_path = path(&["docs", "guide", "/install"]);

    let first = engine.search(&coords(DateSelector::Last(3)), &search_path).await.unwrap();
    let fetched = cached.inner().request_count();
    let second = engine.search(&coords(DateSelector::Last(3)), &search_path).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(cached.inner().request_count(), fetched);
    assert!(cached.stats().hits >= fetched as u64);
}

#[tokio::test]
async fn test_concurrent_requests_get_independent_tables() {
    let cached = Arc::new(CachedGateway::new(three_day_archive(), &CacheConfig::default()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cached = cached.clone();
        handles.push(tokio::spawn(async move {
            let mut data = cached.fetch(&coords(DateSelector::Last(3))).await.unwrap();
            // mutate our copy; nobody else may observe it
            data.for_each_table_mut(&mut |table| table.rows_mut().clear());
            data.row_count()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 0);
    }

    let fresh = cached.fetch(&coords(DateSelector::Last(3))).await.unwrap();
    assert_eq!(fresh.row_count(), 5);
}

// =============================================================================
// Raw Search Values
// =============================================================================

#[tokio::test]
async fn test_raw_url_search_across_periods() {
    let archive = Arc::new(three_day_archive());
    let engine = PathSearchEngine::new(archive, &SearchConfig::default());

    let result = engine
        .search_raw(
            &coords(DateSelector::Last(3)),
            "https://example.org/docs/faq#answers",
            ActionKind::PageUrl,
        )
        .await
        .unwrap();

    assert_eq!(result.row_count(), 2);
}
