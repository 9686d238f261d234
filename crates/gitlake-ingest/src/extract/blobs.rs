//! Blob extraction
//!
//! Mirrors every file referenced by today's curated commit-file rows into
//! object storage. Two independently bounded stages: raw-content fetches
//! share a bounded set of in-flight requests, and uploads run on a separate
//! bound because the storage driver is a different resource. Fetch and upload
//! for one file are sequenced; different files pipeline freely.
//!
//! A fetch failure (too large, since-deleted) skips that file's upload and is
//! logged; it never aborts sibling fetches.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use gitlake_common::keys::blob_object_key;
use gitlake_common::Result;

use crate::config::PipelineConfig;
use crate::github::GithubClient;
use crate::storage::ObjectStore;
use crate::store::{CuratedFileRow, LakeStore};

/// Per-run counts reported by [`run`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BlobSummary {
    pub files_found: usize,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub uploaded: usize,
    pub upload_failed: usize,
}

struct FetchedBlob {
    key: String,
    bytes: Vec<u8>,
}

/// Fetch and upload blobs for every curated commit-file row on `date`.
pub async fn run(
    client: &GithubClient,
    store: &dyn LakeStore,
    objects: &dyn ObjectStore,
    config: &PipelineConfig,
    date: NaiveDate,
) -> Result<BlobSummary> {
    let files = store.curated_files(date).await?;
    info!(count = files.len(), "Found files to process");

    let files_found = files.len();
    if files.is_empty() {
        return Ok(BlobSummary::default());
    }

    objects.ensure_bucket().await?;

    let fetched = AtomicUsize::new(0);
    let fetch_failed = AtomicUsize::new(0);
    let uploaded = AtomicUsize::new(0);
    let upload_failed = AtomicUsize::new(0);

    // Channel depth matches the fetch bound so a stalled uploader applies
    // backpressure instead of buffering every blob in memory.
    let (tx, rx) = mpsc::channel::<FetchedBlob>(config.blob_fetch_concurrency);

    let fetch_stage = async {
        stream::iter(files)
            .map(|file| {
                let tx = tx.clone();
                let fetched = &fetched;
                let fetch_failed = &fetch_failed;
                async move {
                    match fetch_blob(client, &file).await {
                        Some(blob) => {
                            fetched.fetch_add(1, Ordering::Relaxed);
                            // Send fails only when the uploader is gone.
                            let _ = tx.send(blob).await;
                        }
                        None => {
                            fetch_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
            .buffer_unordered(config.blob_fetch_concurrency)
            .for_each(|_| async {})
            .await;
        drop(tx);
    };

    let upload_stage = async {
        ReceiverStream::new(rx)
            .map(|blob| {
                let uploaded = &uploaded;
                let upload_failed = &upload_failed;
                async move {
                    match objects
                        .put(&blob.key, blob.bytes, "application/octet-stream")
                        .await
                    {
                        Ok(result) => {
                            debug!(key = %result.key, size = result.size, "Uploaded blob");
                            uploaded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            warn!(key = %blob.key, error = %e, "Failed to upload blob");
                            upload_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
            .buffer_unordered(config.blob_upload_concurrency)
            .for_each(|_| async {})
            .await;
    };

    tokio::join!(fetch_stage, upload_stage);

    let summary = BlobSummary {
        files_found,
        fetched: fetched.into_inner(),
        fetch_failed: fetch_failed.into_inner(),
        uploaded: uploaded.into_inner(),
        upload_failed: upload_failed.into_inner(),
    };

    info!(
        files = summary.files_found,
        uploaded = summary.uploaded,
        fetch_failed = summary.fetch_failed,
        upload_failed = summary.upload_failed,
        "Blob extraction complete"
    );

    Ok(summary)
}

/// Fetch one file's content at its commit revision. Failures are logged with
/// the identifying key and reported as `None`.
async fn fetch_blob(client: &GithubClient, file: &CuratedFileRow) -> Option<FetchedBlob> {
    let path = format!("repos/{}/contents/{}", file.repo_id, file.file_path);
    debug!(
        path = %file.file_path,
        sha = %file.commit_sha,
        repo = %file.repo_id,
        "Fetching file content"
    );

    match client
        .get_raw(&path, &[("ref", file.commit_sha.clone())])
        .await
    {
        Ok(bytes) => Some(FetchedBlob {
            key: blob_object_key(&file.repo_id, &file.commit_sha, &file.file_path),
            bytes,
        }),
        Err(e) => {
            warn!(
                path = %file.file_path,
                sha = %file.commit_sha,
                repo = %file.repo_id,
                error = %e,
                "Failed to fetch file content"
            );
            None
        }
    }
}
