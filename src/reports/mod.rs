//! Actions reports
//!
//! Public query surface: page URLs, page titles, downloads, outlinks and
//! site search. Every operation fetches (or searches) an archived report,
//! runs it through the normalization pipeline plus the report's own
//! policies, and flushes queued filters before handing it back.
//!
//! # Example
//!
//! ```rust,no_run
//! use kuba_report_search::archive::InMemoryArchive;
//! use kuba_report_search::config::Config;
//! use kuba_report_search::reports::{ActionsReports, ReportQuery};
//! use kuba_report_search::types::{DateSelector, Period, SiteSelector};
//! use std::sync::Arc;
//!
//! # async fn example() -> kuba_report_search::Result<()> {
//! let reports = ActionsReports::new(Arc::new(InMemoryArchive::new()), &Config::default())?;
//! let query = ReportQuery::new(SiteSelector::Single(1), Period::Day, DateSelector::Last(7));
//!
//! let page = reports.page_url(&query, "https://example.org/blog/post").await?;
//! println!("{} rows", page.row_count());
//! # Ok(())
//! # }
//! ```

pub mod categories;

use crate::archive::{fetch_recorded, ArchiveGateway, QueryCoordinates};
use crate::config::Config;
use crate::error::Result;
use crate::metrics;
use crate::pipeline::ReportNormalizer;
use crate::search::{ActionKind, PathSearchEngine};
use crate::table::ReportData;
use crate::types::{DateSelector, Period, SiteSelector, SubtableId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Archived dataset names
pub mod datasets {
    /// Page URLs, nested by folder
    pub const PAGE_URLS: &str = "Actions_actions_url";
    /// Page titles, nested by category
    pub const PAGE_TITLES: &str = "Actions_actions";
    /// Downloads, nested by host
    pub const DOWNLOADS: &str = "Actions_downloads";
    /// Outlinks, nested by host
    pub const OUTLINKS: &str = "Actions_outlink";
    /// Site search keywords
    pub const SITE_SEARCH: &str = "Actions_sitesearch";
    /// Custom variable names, with values in sub-tables
    pub const CUSTOM_VARIABLES: &str = "CustomVariables_valueByName";
}

/// Column read by the pages-per-search quotient of keyword reports
const KEYWORD_HITS_COLUMN: &str = "nb_hits";

/// Caller-facing query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Site(s) to report on
    pub site: SiteSelector,
    /// Period granularity
    pub period: Period,
    /// Date or date range
    pub date: DateSelector,
    /// Optional segment filter
    pub segment: Option<String>,
    /// Load the full row hierarchy
    pub expanded: bool,
    /// Report on one sub-table only
    pub subtable_id: Option<SubtableId>,
    /// Depth limit for expanded reports
    pub depth: Option<u32>,
}

impl ReportQuery {
    /// Top-level, unexpanded, unsegmented query
    pub fn new(site: SiteSelector, period: Period, date: DateSelector) -> Self {
        Self {
            site,
            period,
            date,
            segment: None,
            expanded: false,
            subtable_id: None,
            depth: None,
        }
    }

    /// Builder: segment filter
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Builder: expanded flag
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Builder: sub-table
    pub fn subtable(mut self, id: SubtableId) -> Self {
        self.subtable_id = Some(id);
        self
    }

    /// Builder: depth limit
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Gateway coordinates for a dataset
    pub fn coordinates(&self, dataset: &str) -> QueryCoordinates {
        QueryCoordinates::new(dataset, self.site.clone(), self.period, self.date)
            .with_segment(self.segment.clone())
            .with_expanded(self.expanded)
            .with_optional_subtable(self.subtable_id)
            .with_depth(self.depth)
    }

    /// Unexpanded top-level coordinates, used for searches and lookups
    pub(crate) fn top_level_coordinates(&self, dataset: &str) -> QueryCoordinates {
        QueryCoordinates::new(dataset, self.site.clone(), self.period, self.date)
            .with_segment(self.segment.clone())
    }
}

/// Kind of row set a report keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagePolicy {
    All,
    EntryOnly,
    ExitOnly,
    FollowingSearch,
}

/// Actions report operations
pub struct ActionsReports<G: ?Sized> {
    gateway: Arc<G>,
    engine: PathSearchEngine<G>,
    normalizer: ReportNormalizer,
    search_category_key: String,
}

impl<G> ActionsReports<G>
where
    G: ArchiveGateway + ?Sized,
{
    /// Create the report surface over a gateway
    ///
    /// The configuration is validated first.
    pub fn new(gateway: Arc<G>, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: PathSearchEngine::new(gateway.clone(), &config.search),
            gateway,
            normalizer: ReportNormalizer::new(&config.reports),
            search_category_key: config.reports.search_category_key.clone(),
        })
    }

    /// Replace the search engine (for a custom decomposer)
    pub fn with_engine(mut self, engine: PathSearchEngine<G>) -> Self {
        self.engine = engine;
        self
    }

    /// The normalizer applied to every report
    pub fn normalizer(&self) -> &ReportNormalizer {
        &self.normalizer
    }

    /// Page URL report
    pub async fn page_urls(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.page_report(query, datasets::PAGE_URLS, PagePolicy::All).await;
        observe("page_urls", result)
    }

    /// Page URLs that started at least one visit
    pub async fn entry_page_urls(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.page_report(query, datasets::PAGE_URLS, PagePolicy::EntryOnly).await;
        observe("entry_page_urls", result)
    }

    /// Page URLs that ended at least one visit
    pub async fn exit_page_urls(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.page_report(query, datasets::PAGE_URLS, PagePolicy::ExitOnly).await;
        observe("exit_page_urls", result)
    }

    /// Page URLs viewed right after a site search
    pub async fn page_urls_following_site_search(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self
            .page_report(query, datasets::PAGE_URLS, PagePolicy::FollowingSearch)
            .await;
        observe("page_urls_following_site_search", result)
    }

    /// The row for one page URL
    pub async fn page_url(&self, query: &ReportQuery, url: &str) -> Result<ReportData> {
        let result = self
            .page_search(query, datasets::PAGE_URLS, url, ActionKind::PageUrl)
            .await;
        observe("page_url", result)
    }

    /// Page title report
    pub async fn page_titles(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.page_report(query, datasets::PAGE_TITLES, PagePolicy::All).await;
        observe("page_titles", result)
    }

    /// Page titles that started at least one visit
    pub async fn entry_page_titles(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self
            .page_report(query, datasets::PAGE_TITLES, PagePolicy::EntryOnly)
            .await;
        observe("entry_page_titles", result)
    }

    /// Page titles that ended at least one visit
    pub async fn exit_page_titles(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self
            .page_report(query, datasets::PAGE_TITLES, PagePolicy::ExitOnly)
            .await;
        observe("exit_page_titles", result)
    }

    /// Page titles viewed right after a site search
    pub async fn page_titles_following_site_search(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self
            .page_report(query, datasets::PAGE_TITLES, PagePolicy::FollowingSearch)
            .await;
        observe("page_titles_following_site_search", result)
    }

    /// The row for one page title
    pub async fn page_title(&self, query: &ReportQuery, title: &str) -> Result<ReportData> {
        let result = self
            .page_search(query, datasets::PAGE_TITLES, title, ActionKind::PageTitle)
            .await;
        observe("page_title", result)
    }

    /// Download report
    pub async fn downloads(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.plain_report(query, datasets::DOWNLOADS).await;
        observe("downloads", result)
    }

    /// The row for one download URL
    pub async fn download(&self, query: &ReportQuery, url: &str) -> Result<ReportData> {
        let result = self
            .plain_search(query, datasets::DOWNLOADS, url, ActionKind::Download)
            .await;
        observe("download", result)
    }

    /// Outlink report
    pub async fn outlinks(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.plain_report(query, datasets::OUTLINKS).await;
        observe("outlinks", result)
    }

    /// The row for one outlink URL
    pub async fn outlink(&self, query: &ReportQuery, url: &str) -> Result<ReportData> {
        let result = self
            .plain_search(query, datasets::OUTLINKS, url, ActionKind::Outlink)
            .await;
        observe("outlink", result)
    }

    /// Site search keywords with pages per search
    pub async fn site_search_keywords(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.keyword_report(query, false).await;
        observe("site_search_keywords", result)
    }

    /// Site search keywords that returned no result
    pub async fn site_search_no_result_keywords(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = self.keyword_report(query, true).await;
        observe("site_search_no_result_keywords", result)
    }

    /// Site search categories, taken from the search category custom variable
    pub async fn site_search_categories(&self, query: &ReportQuery) -> Result<ReportData> {
        let result = categories::assemble(
            self.gateway.as_ref(),
            query,
            &self.search_category_key,
        )
        .await
        .map(|mut data| {
            self.normalizer.normalize(&mut data, false);
            self.normalizer.queue_pages_per_search(&mut data, "nb_actions");
            self.normalizer.finish(&mut data);
            data
        });
        observe("site_search_categories", result)
    }

    async fn fetch(&self, query: &ReportQuery, dataset: &str) -> Result<ReportData> {
        fetch_recorded(self.gateway.as_ref(), &query.coordinates(dataset)).await
    }

    async fn page_report(
        &self,
        query: &ReportQuery,
        dataset: &str,
        policy: PagePolicy,
    ) -> Result<ReportData> {
        let data = self.fetch(query, dataset).await?;
        Ok(self.finish_pages(data, query.expanded, policy))
    }

    async fn page_search(
        &self,
        query: &ReportQuery,
        dataset: &str,
        raw: &str,
        kind: ActionKind,
    ) -> Result<ReportData> {
        let data = self
            .engine
            .search_raw(&query.top_level_coordinates(dataset), raw, kind)
            .await?;
        Ok(self.finish_pages(data, false, PagePolicy::All))
    }

    async fn plain_report(&self, query: &ReportQuery, dataset: &str) -> Result<ReportData> {
        let mut data = self.fetch(query, dataset).await?;
        self.normalizer.normalize(&mut data, query.expanded);
        self.normalizer.finish(&mut data);
        Ok(data)
    }

    async fn plain_search(
        &self,
        query: &ReportQuery,
        dataset: &str,
        raw: &str,
        kind: ActionKind,
    ) -> Result<ReportData> {
        let mut data = self
            .engine
            .search_raw(&query.top_level_coordinates(dataset), raw, kind)
            .await?;
        self.normalizer.normalize(&mut data, false);
        self.normalizer.finish(&mut data);
        Ok(data)
    }

    fn finish_pages(&self, mut data: ReportData, expanded: bool, policy: PagePolicy) -> ReportData {
        debug!("Applying {:?} page policy to {} rows", policy, data.row_count());
        self.normalizer.queue_page_metrics(&mut data);
        self.normalizer.normalize(&mut data, expanded);
        match policy {
            PagePolicy::All => {}
            PagePolicy::EntryOnly => self.normalizer.keep_entry_rows(&mut data),
            PagePolicy::ExitOnly => self.normalizer.keep_exit_rows(&mut data),
            PagePolicy::FollowingSearch => self.normalizer.keep_rows_following_search(&mut data),
        }
        self.normalizer.finish(&mut data);
        data
    }

    async fn keyword_report(&self, query: &ReportQuery, no_result_only: bool) -> Result<ReportData> {
        let mut data = self.fetch(query, datasets::SITE_SEARCH).await?;
        if no_result_only {
            self.normalizer.keep_no_result_searches(&mut data);
        } else {
            self.normalizer.drop_no_result_flag(&mut data);
        }

        self.normalizer.queue_page_metrics(&mut data);
        self.normalizer.normalize(&mut data, query.expanded);
        self.normalizer.queue_pages_per_search(&mut data, KEYWORD_HITS_COLUMN);
        self.normalizer.finish(&mut data);
        Ok(data)
    }
}

fn observe(report: &str, result: Result<ReportData>) -> Result<ReportData> {
    metrics::record_report(report, result.is_ok());
    if let Err(e) = &result {
        warn!("Report {} failed: {}", report, e);
    }
    result
}
