//! Period collections
//!
//! A keyed, ordered set of reports returned when a query spans several
//! periods or sites. Key order is the archive's order and survives every
//! derived collection.

use super::ReportData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key name used for period-indexed collections
pub const KEY_DATE: &str = "date";

/// Key name used for site-indexed collections
pub const KEY_SITE: &str = "idSite";

/// Ordered map of key -> report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCollection {
    key_name: String,
    metadata: BTreeMap<String, Value>,
    entries: Vec<(String, ReportData)>,
}

impl PeriodCollection {
    /// Create an empty collection keyed by `key_name`
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            metadata: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    /// Collection keyed by period label
    pub fn by_date() -> Self {
        Self::new(KEY_DATE)
    }

    /// Collection keyed by site id
    pub fn by_site() -> Self {
        Self::new(KEY_SITE)
    }

    /// Builder: add an entry
    pub fn with_entry(mut self, key: impl Into<String>, data: impl Into<ReportData>) -> Self {
        self.insert(key, data);
        self
    }

    /// Same key name and metadata, no entries
    pub fn empty_clone(&self) -> Self {
        Self {
            key_name: self.key_name.clone(),
            metadata: self.metadata.clone(),
            entries: Vec::new(),
        }
    }

    /// What the keys represent (date, idSite, ...)
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Collection-level metadata
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Set a collection-level metadata entry
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Insert an entry; an existing key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, data: impl Into<ReportData>) {
        let key = key.into();
        let data = data.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = data,
            None => self.entries.push((key, data)),
        }
    }

    /// Entry for a key
    pub fn get(&self, key: &str) -> Option<&ReportData> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, data)| data)
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportData)> {
        self.entries.iter().map(|(k, data)| (k.as_str(), data))
    }

    /// Mutable entries in order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ReportData)> {
        self.entries.iter_mut().map(|(k, data)| (k.as_str(), data))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into ordered entries
    pub fn into_entries(self) -> Vec<(String, ReportData)> {
        self.entries
    }
}
