//! Search path decomposition
//!
//! Turns a raw search value (a page URL, a page title, a download or outlink
//! URL) into the label segments stored at each level of the action reports.

use crate::config::SearchConfig;
use crate::error::DecomposeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Kind of action a raw search value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Page view, searched by URL
    PageUrl,
    /// Page view, searched by title
    PageTitle,
    /// File download
    Download,
    /// Outbound link
    Outlink,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::PageUrl => "page_url",
            ActionKind::PageTitle => "page_title",
            ActionKind::Download => "download",
            ActionKind::Outlink => "outlink",
        };
        f.write_str(name)
    }
}

/// Splits raw search values into label paths
pub trait PathDecomposer: Send + Sync {
    /// Decompose a raw value into ordered label segments
    fn decompose(&self, raw: &str, kind: ActionKind) -> Result<Vec<String>, DecomposeError>;
}

/// Decomposer matching the way action reports nest their labels
///
/// Page URLs become folders plus a `/`-prefixed page label, titles become
/// categories plus a space-prefixed leaf, downloads and outlinks become
/// host then path.
#[derive(Debug, Clone)]
pub struct ActionPathDecomposer {
    url_delimiter: String,
    title_delimiter: String,
    level_limit: usize,
    default_action_name: String,
    default_title: String,
}

impl Default for ActionPathDecomposer {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl ActionPathDecomposer {
    /// Create a decomposer from search settings
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            url_delimiter: config.url_category_delimiter.clone(),
            title_delimiter: config.title_category_delimiter.clone(),
            level_limit: config.category_level_limit.max(1),
            default_action_name: config.default_action_name.clone(),
            default_title: config.default_title.clone(),
        }
    }

    fn page_url(&self, raw: &str) -> Result<Vec<String>, DecomposeError> {
        // host is validated, the path keeps the spelling it was given
        let location = if has_scheme(raw) {
            parse_url(raw, raw)?;
            after_authority(raw)
        } else {
            raw
        };

        let without_fragment = location.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let mut path = path.trim_start_matches('/').to_string();
        if path.is_empty() || path.ends_with('/') {
            path.push_str(&self.default_action_name);
        }
        if let Some(query) = query {
            path.push('?');
            path.push_str(query);
        }

        let mut segments = self.split_levels(&path, &self.url_delimiter);
        if segments.is_empty() {
            segments.push(self.default_action_name.clone());
        }
        if let Some(last) = segments.last_mut() {
            *last = format!("/{}", last);
        }
        Ok(segments)
    }

    fn page_title(&self, raw: &str) -> Vec<String> {
        let mut segments = self.split_levels(raw, &self.title_delimiter);
        if segments.is_empty() {
            segments.push(self.default_title.clone());
        }
        if let Some(last) = segments.last_mut() {
            *last = format!(" {}", last);
        }
        segments
    }

    fn host_and_path(&self, raw: &str) -> Result<Vec<String>, DecomposeError> {
        let (candidate, location) = if has_scheme(raw) {
            (raw.to_string(), after_authority(raw))
        } else {
            let bare = raw.trim_start_matches('/');
            (format!("http://{}", bare), after_host(bare))
        };
        let url = parse_url(&candidate, raw)?;
        let host = url.host_str().ok_or_else(|| DecomposeError::InvalidUrl {
            input: raw.to_string(),
            reason: "missing host".to_string(),
        })?;

        let rest = format!("/{}", location.trim_start_matches('/'));
        Ok(vec![host.to_string(), rest])
    }

    /// Split on a delimiter, keeping the remainder in the last piece
    fn split_levels(&self, value: &str, delimiter: &str) -> Vec<String> {
        let pieces: Vec<&str> = if delimiter.is_empty() {
            vec![value]
        } else {
            value.splitn(self.level_limit, delimiter).collect()
        };

        pieces
            .into_iter()
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl PathDecomposer for ActionPathDecomposer {
    fn decompose(&self, raw: &str, kind: ActionKind) -> Result<Vec<String>, DecomposeError> {
        match kind {
            ActionKind::PageUrl => self.page_url(raw.trim()),
            ActionKind::PageTitle => Ok(self.page_title(raw.trim())),
            ActionKind::Download | ActionKind::Outlink => self.host_and_path(raw.trim()),
        }
    }
}

fn has_scheme(raw: &str) -> bool {
    match raw.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Everything after `scheme://authority`, as written
fn after_authority(raw: &str) -> &str {
    match raw.split_once("://") {
        Some((_, rest)) => after_host(rest),
        None => raw,
    }
}

/// Everything after the leading authority of a scheme-less location
fn after_host(location: &str) -> &str {
    match location.find(['/', '?', '#']) {
        Some(index) => &location[index..],
        None => "",
    }
}

fn parse_url(candidate: &str, raw: &str) -> Result<Url, DecomposeError> {
    Url::parse(candidate).map_err(|e| DecomposeError::InvalidUrl {
        input: raw.to_string(),
        reason: e.to_string(),
    })
}
