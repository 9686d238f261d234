//! Repository discovery
//!
//! Searches the source for popular repositories and lands the collected
//! records in one batch, keyed by full name. Pagination stops at the
//! requested limit, an empty page, or the source's result-window ceiling,
//! whichever comes first.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use gitlake_common::Result;

use crate::config::PipelineConfig;
use crate::github::GithubClient;
use crate::store::{LakeStore, RawRecord, LANDING_REPOSITORIES};

/// Popularity/recency filter for discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub created_after: Option<NaiveDate>,
    pub pushed_after: Option<NaiveDate>,
}

impl DiscoveryOptions {
    /// Search qualifier string: stars threshold plus optional recency
    /// predicates.
    fn query(&self) -> String {
        let mut query = String::from("stars:>1000");
        if let Some(created) = self.created_after {
            query.push_str(&format!(" created:>{}", created));
        }
        if let Some(pushed) = self.pushed_after {
            query.push_str(&format!(" pushed:>{}", pushed));
        }
        query
    }
}

/// Collect up to `limit` repository records matching the filter.
pub async fn discover_repositories(
    client: &GithubClient,
    config: &PipelineConfig,
    limit: usize,
    options: &DiscoveryOptions,
) -> Result<Vec<Value>> {
    let query = options.query();
    let mut items: Vec<Value> = Vec::new();
    let mut page = 1usize;

    while items.len() < limit {
        let remaining = limit - items.len();
        let per_page = config.page_size.min(remaining);

        let body = client
            .get_json(
                "search/repositories",
                &[
                    ("q", query.clone()),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        let batch = body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if batch.is_empty() {
            break;
        }

        items.extend(batch);
        page += 1;
        if page > config.page_ceiling {
            // The search API serves a bounded result window; stop rather
            // than paging past it.
            info!(
                pages = config.page_ceiling,
                collected = items.len(),
                "Hit source page ceiling"
            );
            break;
        }
    }

    Ok(items)
}

/// Discover repositories and land them, keyed by full name.
///
/// Returns the number of records landed.
pub async fn run(
    client: &GithubClient,
    store: &dyn LakeStore,
    config: &PipelineConfig,
    limit: usize,
    options: &DiscoveryOptions,
    date: NaiveDate,
) -> Result<usize> {
    let repos = discover_repositories(client, config, limit, options).await?;

    let rows: Vec<RawRecord> = repos
        .into_iter()
        .filter_map(|repo| match repo.get("full_name").and_then(Value::as_str) {
            Some(full_name) => Some(RawRecord::new(full_name.to_string(), repo)),
            None => {
                warn!("Skipping repository record without full_name");
                None
            }
        })
        .collect();

    store.upsert_raw(LANDING_REPOSITORIES, &rows, date).await?;

    info!(
        count = rows.len(),
        "Retrieved and landed repositories with full metadata"
    );

    Ok(rows.len())
}
