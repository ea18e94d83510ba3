//! Error types for report search and normalization

use thiserror::Error;

/// Main error type for the crate
///
/// A missing label during path search is not an error: the engine answers
/// with an empty table instead. Only contract violations and gateway failures
/// surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Traversal reached a value that cannot be searched
    ///
    /// Raised when a fetched archive is neither a table nor a collection, or
    /// when a matched row has no sub-table while path segments remain.
    #[error("Unsupported report shape: {0}")]
    UnsupportedShape(String),

    /// The archive gateway failed; propagated unchanged
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Query parameters could not be interpreted
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Archive gateway errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No archive exists for the requested coordinates
    #[error("No archive for dataset {dataset}: {detail}")]
    NotArchived {
        /// Dataset that was requested
        dataset: String,
        /// Description of the missing coordinates
        detail: String,
    },

    /// Caller is not allowed to read the requested site
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The backing store failed
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Search-string decomposition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecomposeError {
    /// Input looks like a URL but cannot be parsed as one
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl {
        /// The raw search string
        input: String,
        /// Parser message
        reason: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
