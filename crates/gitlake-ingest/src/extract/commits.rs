//! Commit extraction
//!
//! For each repository landed today, fetches recent commits, tags each with
//! its owning (owner, repo), and lands the batch keyed by SHA. One
//! repository's failure (deleted, renamed, network error) is logged and never
//! aborts the remaining repositories.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use gitlake_common::Result;

use crate::github::GithubClient;
use crate::store::{LakeStore, RawRecord, LANDING_COMMITS};

/// Time window and size bound for commit fetches
#[derive(Debug, Clone, Default)]
pub struct CommitWindow {
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Per-run counts reported by [`run`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub repos_processed: usize,
    pub repos_failed: usize,
    pub commits_landed: usize,
}

/// Fetch up to `limit` recent commits for one `owner/repo`.
pub async fn fetch_commits(
    client: &GithubClient,
    repo: &str,
    limit: usize,
    window: &CommitWindow,
) -> Result<Vec<Value>> {
    let mut query = vec![("per_page", limit.to_string())];
    if let Some(since) = &window.since {
        query.push(("since", since.clone()));
    }
    if let Some(until) = &window.until {
        query.push(("until", until.clone()));
    }

    let body = client
        .get_json(&format!("repos/{}/commits", repo), &query)
        .await?;

    Ok(body.as_array().cloned().unwrap_or_default())
}

/// Extract commits for every repository in today's landing partition.
pub async fn run(
    client: &GithubClient,
    store: &dyn LakeStore,
    limit: usize,
    window: &CommitWindow,
    date: NaiveDate,
) -> Result<CommitSummary> {
    let repos = store.repo_ids(date).await?;
    info!(count = repos.len(), "Found repositories to process");

    let mut summary = CommitSummary::default();

    for repo in &repos {
        match extract_for_repo(client, store, repo, limit, window, date).await {
            Ok(landed) => {
                summary.repos_processed += 1;
                summary.commits_landed += landed;
            }
            // Source failures are per-repository; landing failures are not.
            Err(e) if e.is_skippable() => {
                warn!(repo = %repo, error = %e, "Failed to fetch commits");
                summary.repos_failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        repos = summary.repos_processed,
        failed = summary.repos_failed,
        commits = summary.commits_landed,
        "Commit extraction complete"
    );

    Ok(summary)
}

async fn extract_for_repo(
    client: &GithubClient,
    store: &dyn LakeStore,
    repo: &str,
    limit: usize,
    window: &CommitWindow,
    date: NaiveDate,
) -> Result<usize> {
    let Some((owner, name)) = repo.split_once('/') else {
        warn!(repo = %repo, "Skipping repository id without owner/name form");
        return Ok(0);
    };

    let commits = fetch_commits(client, repo, limit, window).await?;
    if commits.is_empty() {
        info!(repo = %repo, "No commits found");
        return Ok(0);
    }

    let rows: Vec<RawRecord> = commits
        .into_iter()
        .filter_map(|commit| tag_commit(commit, owner, name))
        .collect();

    store.upsert_raw(LANDING_COMMITS, &rows, date).await?;
    info!(repo = %repo, count = rows.len(), "Landed commits");

    Ok(rows.len())
}

/// Tag a commit record with its owning repository and key it by SHA.
fn tag_commit(mut commit: Value, owner: &str, name: &str) -> Option<RawRecord> {
    let sha = commit.get("sha").and_then(Value::as_str)?.to_string();

    let object = commit.as_object_mut()?;
    object.insert("owner".to_string(), Value::String(owner.to_string()));
    object.insert("repo".to_string(), Value::String(name.to_string()));

    Some(RawRecord::new(sha, commit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_commit_adds_owner_and_repo_and_keys_by_sha() {
        let commit = json!({"sha": "abc123", "commit": {"message": "fix"}});
        let record = tag_commit(commit, "rust-lang", "rust").unwrap();

        assert_eq!(record.id, "abc123");
        assert_eq!(record.payload["owner"], "rust-lang");
        assert_eq!(record.payload["repo"], "rust");
        assert_eq!(record.payload["commit"]["message"], "fix");
    }

    #[test]
    fn tag_commit_drops_records_without_sha() {
        assert!(tag_commit(json!({"commit": {}}), "a", "b").is_none());
    }
}
