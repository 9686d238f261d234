//! Configuration management
//!
//! Every knob the pipeline components read — request headers, page limits,
//! concurrency bounds — is loaded here and passed in at construction. No
//! component reads ambient state.

use serde::{Deserialize, Serialize};

use crate::storage::config::StorageConfig;

// ============================================================================
// Source Client Defaults
// ============================================================================

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default connection-pool bound for source fetches.
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;

// ============================================================================
// Pipeline Defaults
// ============================================================================

/// Default number of repositories collected by discovery.
pub const DEFAULT_DISCOVERY_LIMIT: usize = 10;

/// Default number of recent commits fetched per repository.
pub const DEFAULT_COMMIT_LIMIT: usize = 10;

/// Search page size requested from the source.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Source-imposed result-window ceiling: the search API serves at most this
/// many pages, so pagination must stop gracefully there.
pub const DEFAULT_PAGE_CEILING: usize = 10;

/// Default number of concurrent in-flight commit-detail fetches.
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 5;

/// Default number of concurrent in-flight blob content fetches.
pub const DEFAULT_BLOB_FETCH_CONCURRENCY: usize = 20;

/// Default number of concurrent blob uploads.
pub const DEFAULT_BLOB_UPLOAD_CONCURRENCY: usize = 10;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/gitlake";

/// Source client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub token: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_connections: usize,
}

impl GithubConfig {
    /// Configuration pointing at a non-default base URL, used by tests to
    /// target a local mock server.
    pub fn for_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Pagination and concurrency bounds for the pipeline stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub discovery_limit: usize,
    pub commit_limit: usize,
    pub page_size: usize,
    pub page_ceiling: usize,
    pub detail_concurrency: usize,
    pub blob_fetch_concurrency: usize,
    pub blob_upload_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            discovery_limit: DEFAULT_DISCOVERY_LIMIT,
            commit_limit: DEFAULT_COMMIT_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            page_ceiling: DEFAULT_PAGE_CEILING,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
            blob_fetch_concurrency: DEFAULT_BLOB_FETCH_CONCURRENCY,
            blob_upload_concurrency: DEFAULT_BLOB_UPLOAD_CONCURRENCY,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub database_url: String,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            github: GithubConfig {
                token: std::env::var("GITHUB_TOKEN")
                    .map_err(|_| anyhow::anyhow!("GITHUB_TOKEN must be set"))?,
                base_url: std::env::var("GITHUB_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
                timeout_secs: env_parsed("GITLAKE_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS),
                max_connections: env_parsed("GITLAKE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            },
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            pipeline: PipelineConfig {
                discovery_limit: env_parsed("GITLAKE_DISCOVERY_LIMIT", DEFAULT_DISCOVERY_LIMIT),
                commit_limit: env_parsed("GITLAKE_COMMIT_LIMIT", DEFAULT_COMMIT_LIMIT),
                page_size: env_parsed("GITLAKE_PAGE_SIZE", DEFAULT_PAGE_SIZE),
                page_ceiling: env_parsed("GITLAKE_PAGE_CEILING", DEFAULT_PAGE_CEILING),
                detail_concurrency: env_parsed(
                    "GITLAKE_DETAIL_CONCURRENCY",
                    DEFAULT_DETAIL_CONCURRENCY,
                ),
                blob_fetch_concurrency: env_parsed(
                    "GITLAKE_BLOB_FETCH_CONCURRENCY",
                    DEFAULT_BLOB_FETCH_CONCURRENCY,
                ),
                blob_upload_concurrency: env_parsed(
                    "GITLAKE_BLOB_UPLOAD_CONCURRENCY",
                    DEFAULT_BLOB_UPLOAD_CONCURRENCY,
                ),
            },
            storage: StorageConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.github.token.is_empty() {
            anyhow::bail!("GitHub token cannot be empty");
        }

        if self.database_url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.pipeline.page_size == 0 {
            anyhow::bail!("Page size must be greater than 0");
        }

        if self.pipeline.page_ceiling == 0 {
            anyhow::bail!("Page ceiling must be greater than 0");
        }

        let bounds = [
            ("detail_concurrency", self.pipeline.detail_concurrency),
            (
                "blob_fetch_concurrency",
                self.pipeline.blob_fetch_concurrency,
            ),
            (
                "blob_upload_concurrency",
                self.pipeline.blob_upload_concurrency,
            ),
        ];
        for (name, value) in bounds {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
