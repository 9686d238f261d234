//! Typed wrapper over the GitHub REST API
//!
//! Issues authenticated GET requests and maps non-2xx responses to
//! [`GitLakeError::Source`] with the status and path, leaving skip-or-abort
//! decisions to the caller. No retry happens here; retry policy is a caller
//! concern.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use gitlake_common::{GitLakeError, Result};

use crate::config::GithubConfig;

/// Accept header for JSON API responses.
const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Accept header that makes the contents endpoint return raw bytes.
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// Authenticated client for the GitHub REST API
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
}

impl GithubClient {
    /// Create a client with the bearer credential installed as a default
    /// header and the connection pool bounded per configuration.
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", config.token))
            .map_err(|e| GitLakeError::Config(format!("invalid GitHub token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_connections)
            .user_agent("gitlake-ingest/0.1")
            .build()
            .map_err(|e| GitLakeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON document from `path` with the given query parameters.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(path, query, ACCEPT_JSON).await?;
        response
            .json()
            .await
            .map_err(|e| GitLakeError::Network(e.to_string()))
    }

    /// GET raw bytes from `path`, using the raw-content accept header.
    pub async fn get_raw(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let response = self.get(path, query, ACCEPT_RAW).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GitLakeError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: &'static str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, accept)
            .query(query)
            .send()
            .await
            .map_err(|e| GitLakeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitLakeError::source(status.as_u16(), path));
        }

        Ok(response)
    }
}
