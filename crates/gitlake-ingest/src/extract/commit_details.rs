//! Commit detail extraction
//!
//! For each commit landed today, fetches the per-file change list and lands
//! it immediately, so partial progress survives a mid-run abort. Commits are
//! processed by a bounded worker set; each task's failure is captured as a
//! typed result and logged without cancelling siblings.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use gitlake_common::{GitLakeError, Result};

use crate::github::GithubClient;
use crate::store::{CommitRef, LakeStore, RawRecord, LANDING_COMMIT_FILES};

/// Per-run counts reported by [`run`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DetailSummary {
    pub commits_processed: usize,
    pub commits_failed: usize,
    pub files_landed: usize,
}

/// Fetch the file-change records for one commit, tagged and keyed for the
/// commit-files landing table.
pub async fn fetch_commit_files(
    client: &GithubClient,
    repo_id: &str,
    commit_sha: &str,
    date: NaiveDate,
) -> Result<Vec<RawRecord>> {
    let body = client
        .get_json(&format!("repos/{}/commits/{}", repo_id, commit_sha), &[])
        .await?;

    let files = body
        .get("files")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::with_capacity(files.len());
    for mut file in files {
        let Some(filename) = file.get("filename").and_then(Value::as_str) else {
            warn!(sha = %commit_sha, "Skipping file record without filename");
            continue;
        };
        let id = gitlake_common::keys::composite_file_id(commit_sha, filename);

        let Some(object) = file.as_object_mut() else {
            continue;
        };
        object.insert("repo_id".to_string(), Value::String(repo_id.to_string()));
        object.insert(
            "commit_sha".to_string(),
            Value::String(commit_sha.to_string()),
        );
        object.insert(
            "ingestion_date".to_string(),
            Value::String(date.to_string()),
        );
        object.insert("id".to_string(), Value::String(id.clone()));

        records.push(RawRecord::new(id, file));
    }

    Ok(records)
}

/// Extract file-change details for every commit in today's landing partition
/// with bounded parallelism.
pub async fn run(
    client: &GithubClient,
    store: &dyn LakeStore,
    concurrency: usize,
    date: NaiveDate,
) -> Result<DetailSummary> {
    let commits = store.commit_refs(date).await?;
    info!(count = commits.len(), "Found commits to process");

    let results: Vec<std::result::Result<usize, (CommitRef, GitLakeError)>> =
        stream::iter(commits)
            .map(|commit| async move {
                process_commit(client, store, &commit, date)
                    .await
                    .map_err(|e| (commit, e))
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut summary = DetailSummary::default();
    for result in results {
        match result {
            Ok(files) => {
                summary.commits_processed += 1;
                summary.files_landed += files;
            }
            // Source failures are per-commit; landing failures abort the run.
            Err((commit, e)) if e.is_skippable() => {
                warn!(
                    sha = %commit.sha,
                    repo = %commit.repo_id,
                    error = %e,
                    "Failed to fetch commit files"
                );
                summary.commits_failed += 1;
            }
            Err((_, e)) => return Err(e),
        }
    }

    info!(
        commits = summary.commits_processed,
        failed = summary.commits_failed,
        files = summary.files_landed,
        "Commit detail extraction complete"
    );

    Ok(summary)
}

async fn process_commit(
    client: &GithubClient,
    store: &dyn LakeStore,
    commit: &CommitRef,
    date: NaiveDate,
) -> Result<usize> {
    let records = fetch_commit_files(client, &commit.repo_id, &commit.sha, date).await?;

    if records.is_empty() {
        debug!(sha = %commit.sha, "No files found for commit");
        return Ok(0);
    }

    // Land per commit as soon as fetched rather than batching the run.
    store
        .upsert_raw(LANDING_COMMIT_FILES, &records, date)
        .await?;
    info!(sha = %commit.sha, count = records.len(), "Landed files for commit");

    Ok(records.len())
}
