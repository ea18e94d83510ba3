//! Label path search over archived reports
//!
//! Resolves a label path level by level. Rows only reference their children
//! by id, so every step below the root re-fetches the child table through the
//! gateway, pinned to the period of the table it was found in.
//!
//! Multi-period answers fan out: every entry of the outer collection is
//! searched, concurrently, and the result keeps the collection's key order.
//! Collections found below the outer level are one logical answer instead,
//! so the first entry yielding rows wins.

use super::decompose::{ActionKind, ActionPathDecomposer, PathDecomposer};
use crate::archive::{fetch_recorded, ArchiveGateway, QueryCoordinates};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::table::{ReportData, ReportTable};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Path search engine
pub struct PathSearchEngine<G: ?Sized> {
    gateway: Arc<G>,
    decomposer: Box<dyn PathDecomposer>,
}

impl<G> PathSearchEngine<G>
where
    G: ArchiveGateway + ?Sized,
{
    /// Create an engine using the default action path decomposer
    pub fn new(gateway: Arc<G>, config: &SearchConfig) -> Self {
        Self {
            gateway,
            decomposer: Box::new(ActionPathDecomposer::new(config)),
        }
    }

    /// Replace the decomposer
    pub fn with_decomposer(mut self, decomposer: Box<dyn PathDecomposer>) -> Self {
        self.decomposer = decomposer;
        self
    }

    /// The gateway searches fetch from
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Decompose a raw search value and search for it
    ///
    /// If the value cannot be decomposed, the raw value is searched as a
    /// single segment.
    pub async fn search_raw(
        &self,
        coords: &QueryCoordinates,
        raw: &str,
        kind: ActionKind,
    ) -> Result<ReportData> {
        let path = match self.decomposer.decompose(raw, kind) {
            Ok(path) => path,
            Err(e) => {
                warn!("Searching raw {} value '{}': {}", kind, raw, e);
                vec![raw.to_string()]
            }
        };
        self.search(coords, &path).await
    }

    /// Fetch the root report and resolve a label path against it
    pub async fn search(&self, coords: &QueryCoordinates, path: &[String]) -> Result<ReportData> {
        if path.is_empty() {
            return Err(Error::InvalidQuery("empty search path".to_string()));
        }

        debug!("Searching {} for path {:?}", coords.dataset(), path);
        let root = fetch_recorded(self.gateway.as_ref(), coords).await?;
        self.search_in(root, coords, path).await
    }

    /// Resolve a label path against an already fetched report
    pub async fn search_in(
        &self,
        root: ReportData,
        coords: &QueryCoordinates,
        path: &[String],
    ) -> Result<ReportData> {
        match root {
            ReportData::Multi(collection) => {
                let mut output = collection.empty_clone();
                let branches = collection.into_entries().into_iter().map(|(key, entry)| async move {
                    let resolved = self.resolve_first(entry, coords, path).await?;
                    Ok::<_, Error>((key, resolved))
                });

                for (key, table) in try_join_all(branches).await? {
                    output.insert(key, table);
                }
                Ok(ReportData::Multi(output))
            }
            other => Ok(ReportData::Single(
                self.resolve_first(other, coords, path).await?,
            )),
        }
    }

    /// Resolve against a table, or against the first entry of a nested
    /// collection that yields rows
    fn resolve_first<'a>(
        &'a self,
        data: ReportData,
        coords: &'a QueryCoordinates,
        path: &'a [String],
    ) -> BoxFuture<'a, Result<ReportTable>> {
        async move {
            match data {
                ReportData::Single(table) => self.resolve_table(table, coords, path).await,
                ReportData::Multi(collection) => {
                    for (key, entry) in collection.into_entries() {
                        let resolved = self.resolve_first(entry, coords, path).await?;
                        if !resolved.is_empty() {
                            debug!("Nested entry '{}' matched, skipping the rest", key);
                            return Ok(resolved);
                        }
                    }
                    Ok(ReportTable::new())
                }
                ReportData::Scalar(value) => Err(Error::UnsupportedShape(format!(
                    "cannot search {} for {:?}: got scalar value {}",
                    coords.dataset(),
                    path,
                    value
                ))),
            }
        }
        .boxed()
    }

    fn resolve_table<'a>(
        &'a self,
        mut table: ReportTable,
        coords: &'a QueryCoordinates,
        path: &'a [String],
    ) -> BoxFuture<'a, Result<ReportTable>> {
        async move {
            let Some((segment, rest)) = path.split_first() else {
                return Ok(table);
            };

            let Some(index) = table.rows().iter().position(|row| row.label == *segment) else {
                debug!("No row labeled '{}' in {}", segment, coords.dataset());
                metrics::record_search(false);
                return Ok(table.empty_clone());
            };

            let metadata = table.metadata().clone();
            let row = table.take_rows().swap_remove(index);

            if rest.is_empty() {
                metrics::record_search(true);
                return Ok(ReportTable::with_single_row(row, metadata));
            }

            let Some(subtable) = row.subtable else {
                warn!(
                    "Row '{}' in {} has no sub-table, {} segment(s) left",
                    segment,
                    coords.dataset(),
                    rest.len()
                );
                return Err(Error::UnsupportedShape(format!(
                    "row '{}' in {} has no sub-table but {} path segment(s) remain",
                    segment,
                    coords.dataset(),
                    rest.len()
                )));
            };

            let mut next = coords.with_subtable(subtable.id);
            if let Some(period) = metadata.period {
                next = next.with_date(period.as_date_range());
            }

            let child = match subtable.loaded {
                Some(loaded) => ReportData::Single(*loaded),
                None => {
                    debug!(
                        "Descending into sub-table {} of '{}' ({} left)",
                        subtable.id,
                        segment,
                        rest.len()
                    );
                    fetch_recorded(self.gateway.as_ref(), &next).await?
                }
            };

            self.resolve_first(child, &next, rest).await
        }
        .boxed()
    }
}
