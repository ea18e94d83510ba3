//! Configuration management for report search
//!
//! TOML file support, environment variable overrides and sensible defaults.
//! Every section and field may be omitted from the file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Search-string decomposition
    #[serde(default)]
    pub search: SearchConfig,

    /// Report normalization
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Gateway response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Search-string decomposition settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Separator between URL path categories
    #[serde(default = "default_url_delimiter")]
    pub url_category_delimiter: String,

    /// Separator between page title categories (empty disables splitting)
    #[serde(default = "default_title_delimiter")]
    pub title_category_delimiter: String,

    /// Maximum number of path segments; the last one keeps the remainder
    #[serde(default = "default_category_level_limit")]
    pub category_level_limit: usize,

    /// Page name used for an empty path or a path ending in the delimiter
    #[serde(default = "default_action_name")]
    pub default_action_name: String,

    /// Title used for an empty page title
    #[serde(default = "default_title")]
    pub default_title: String,
}

/// Report normalization settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportsConfig {
    /// Column every report is sorted on (descending)
    #[serde(default = "default_sort_column")]
    pub sort_column: String,

    /// Public label of the summary row
    #[serde(default = "default_others_label")]
    pub others_label: String,

    /// Decimal places of the pages-per-search column
    #[serde(default = "default_pages_per_search_precision")]
    pub pages_per_search_precision: u32,

    /// Custom-variable name under which site-search categories are stored
    #[serde(default = "default_search_category_key")]
    pub search_category_key: String,
}

/// Gateway response cache settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached archive responses
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    /// Time-to-live of a cached response in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Monitoring configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Record Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

// Default value functions
fn default_url_delimiter() -> String { "/".to_string() }
fn default_title_delimiter() -> String { "/".to_string() }
fn default_category_level_limit() -> usize { 10 }
fn default_action_name() -> String { "index".to_string() }
fn default_title() -> String { "Page Name not defined".to_string() }
fn default_sort_column() -> String { "nb_visits".to_string() }
fn default_others_label() -> String { "Others".to_string() }
fn default_pages_per_search_precision() -> u32 { 1 }
fn default_search_category_key() -> String { "_pk_scat".to_string() }
fn default_cache_max_entries() -> usize { 1000 }
fn default_cache_ttl_secs() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url_category_delimiter: default_url_delimiter(),
            title_category_delimiter: default_title_delimiter(),
            category_level_limit: default_category_level_limit(),
            default_action_name: default_action_name(),
            default_title: default_title(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            sort_column: default_sort_column(),
            others_label: default_others_label(),
            pages_per_search_precision: default_pages_per_search_precision(),
            search_category_key: default_search_category_key(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_cache_max_entries(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate cache settings
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_entries == 0 {
            return Err(Error::Configuration(
                "Cache max entries must be > 0 when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        // Search
        if let Ok(delimiter) = std::env::var("REPORTS_URL_CATEGORY_DELIMITER") {
            self.search.url_category_delimiter = delimiter;
        }
        if let Ok(limit) = std::env::var("REPORTS_CATEGORY_LEVEL_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.search.category_level_limit = l;
            }
        }

        // Cache
        if let Ok(enabled) = std::env::var("REPORTS_CACHE_ENABLED") {
            if let Ok(e) = enabled.parse() {
                self.cache.enabled = e;
            }
        }
        if let Ok(ttl) = std::env::var("REPORTS_CACHE_TTL_SECS") {
            if let Ok(t) = ttl.parse() {
                self.cache.ttl_secs = t;
            }
        }

        // Monitoring
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.monitoring.log_level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.search.url_category_delimiter.is_empty() {
            return Err(Error::Configuration(
                "URL category delimiter cannot be empty".to_string(),
            ));
        }
        if self.search.category_level_limit == 0 {
            return Err(Error::Configuration(
                "Category level limit must be > 0".to_string(),
            ));
        }
        if self.search.default_action_name.trim().is_empty() {
            return Err(Error::Configuration(
                "Default action name cannot be empty".to_string(),
            ));
        }
        if self.reports.sort_column.is_empty() {
            return Err(Error::Configuration("Sort column cannot be empty".to_string()));
        }
        if self.reports.pages_per_search_precision > 10 {
            return Err(Error::Configuration(
                "Pages per search precision cannot exceed 10".to_string(),
            ));
        }
        self.cache.validate()
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.url_category_delimiter, "/");
        assert_eq!(config.reports.others_label, "Others");
        assert_eq!(config.reports.sort_column, "nb_visits");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_level_limit() {
        let mut config = Config::default();
        config.search.category_level_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_enabled_cache_is_invalid() {
        let mut config = Config::default();
        config.cache.max_entries = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [reports]
            others_label = "Autres"

            [cache]
            ttl_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.reports.others_label, "Autres");
        assert_eq!(config.reports.sort_column, "nb_visits");
        assert_eq!(config.cache.ttl(), Duration::from_secs(5));
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.toml");

        let mut config = Config::default();
        config.search.category_level_limit = 4;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("REPORTS_CACHE_TTL_SECS", "900");
        let config = Config::from_env();
        assert_eq!(config.cache.ttl_secs, 900);
        std::env::remove_var("REPORTS_CACHE_TTL_SECS");
    }
}
