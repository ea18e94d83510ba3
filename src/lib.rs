//! Kuba Report Search - hierarchical search and normalization over archived analytics reports
//!
//! This library answers label path queries against period-indexed report
//! archives and normalizes every report the same way before it is returned:
//! - Label path search across single tables and multi-period collections
//! - Lazy re-fetch of child tables through a pluggable archive gateway
//! - Two-phase filter pipeline (eager transforms, queued output transforms)
//! - Page, download, outlink and site search reports built on top of both

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod table;
pub mod types;

/// Prometheus metrics and telemetry
pub mod metrics;

/// Configuration management with TOML support
pub mod config;

/// Tracing subscriber setup
pub mod logging;

/// Archive gateway interface, in-memory archive and response cache
pub mod archive;

/// Report filters and the normalization pipeline
/// Provides column renaming, sorting, label decoding, grouping and row policies
pub mod pipeline;

/// Label path decomposition and hierarchical search
pub mod search;

/// Public report operations (page URLs, titles, downloads, outlinks, site search)
pub mod reports;

// Re-export main types
pub use archive::{ArchiveGateway, CachedGateway, InMemoryArchive, QueryCoordinates};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{ReportNormalizer, TableFilter};
pub use reports::{ActionsReports, ReportQuery};
pub use search::{ActionKind, PathSearchEngine};
pub use table::{MetricValue, PeriodCollection, ReportData, ReportTable, Row};
pub use types::{DateSelector, Period, PeriodSpan, SiteSelector};
