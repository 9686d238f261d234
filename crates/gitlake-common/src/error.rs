//! Error types for GitLake

use thiserror::Error;

/// Result type alias for GitLake operations
pub type Result<T> = std::result::Result<T, GitLakeError>;

/// Main error type for the extraction-and-curation pipeline
#[derive(Error, Debug)]
pub enum GitLakeError {
    /// Non-2xx response from the source API. Recoverable by skipping the
    /// entity (repository, commit, or file) that triggered the request.
    #[error("source returned {status} for {path}")]
    Source { status: u16, path: String },

    #[error("network error: {0}")]
    Network(String),

    /// Malformed or missing data during curated projection. Fatal to the
    /// curated build; partial curated tables are unsafe downstream.
    #[error("transform error: {0}")]
    Transform(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("object storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GitLakeError {
    /// Build a `Source` error from a status code and the request path.
    pub fn source(status: u16, path: impl Into<String>) -> Self {
        Self::Source {
            status,
            path: path.into(),
        }
    }

    /// True for failures handled by skip-and-log at the per-entity unit.
    /// Landing, curated, and configuration failures are not skippable.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Source { .. } | Self::Network(_))
    }
}
