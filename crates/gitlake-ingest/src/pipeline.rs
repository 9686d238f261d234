//! Full pipeline run
//!
//! Runs the five stages in dependency order over today's partition:
//! discovery → commits → commit details → curated build → blobs. The curated
//! build is the only stage allowed to abort the run once landing has started;
//! blob extraction never runs against stale curated data.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::curated;
use crate::extract::commits::CommitWindow;
use crate::extract::repos::DiscoveryOptions;
use crate::extract::{blobs, commit_details, commits, repos};
use crate::github::GithubClient;
use crate::storage::ObjectStore;
use crate::store::LakeStore;

/// Run every stage for one ingestion date.
pub async fn run_all(
    client: &GithubClient,
    store: &dyn LakeStore,
    objects: &dyn ObjectStore,
    config: &Config,
    discovery: &DiscoveryOptions,
    window: &CommitWindow,
    date: NaiveDate,
) -> Result<()> {
    store
        .init_schema()
        .await
        .context("Failed to initialize landing schema")?;

    let pipeline = &config.pipeline;

    repos::run(
        client,
        store,
        pipeline,
        pipeline.discovery_limit,
        discovery,
        date,
    )
    .await
    .context("Repository discovery failed")?;

    commits::run(client, store, pipeline.commit_limit, window, date)
        .await
        .context("Commit extraction failed")?;

    commit_details::run(client, store, pipeline.detail_concurrency, date)
        .await
        .context("Commit detail extraction failed")?;

    // Fatal on failure: downstream blob extraction reads curated rows.
    curated::build(store)
        .await
        .context("Curated layer build failed")?;

    blobs::run(client, store, objects, pipeline, date)
        .await
        .context("Blob extraction failed")?;

    info!(date = %date, "Pipeline run complete");

    Ok(())
}
