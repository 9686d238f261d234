//! GitLake Ingest - GitHub metadata extraction pipeline

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use gitlake_common::logging::{init_logging, LogConfig};
use gitlake_ingest::config::Config;
use gitlake_ingest::extract::commits::CommitWindow;
use gitlake_ingest::extract::repos::DiscoveryOptions;
use gitlake_ingest::extract::{blobs, commit_details, commits, repos};
use gitlake_ingest::github::GithubClient;
use gitlake_ingest::storage::S3Storage;
use gitlake_ingest::store::{LakeStore, PgLakeStore};
use gitlake_ingest::{curated, pipeline};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gitlake-ingest")]
#[command(author, version, about = "GitHub metadata extraction-and-curation pipeline")]
struct Cli {
    /// Pipeline stage to run
    #[command(subcommand)]
    stage: Stage,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Stage {
    /// Discover popular repositories and land them raw
    DiscoverRepos {
        /// Number of repositories to collect
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only repositories created after this date (YYYY-MM-DD)
        #[arg(long)]
        created_after: Option<NaiveDate>,

        /// Only repositories pushed after this date (YYYY-MM-DD)
        #[arg(long)]
        pushed_after: Option<NaiveDate>,
    },

    /// Fetch recent commits for today's discovered repositories
    ExtractCommits {
        /// Commits fetched per repository
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only commits after this timestamp (ISO 8601)
        #[arg(long)]
        since: Option<String>,

        /// Only commits before this timestamp (ISO 8601)
        #[arg(long)]
        until: Option<String>,
    },

    /// Fetch per-file change details for today's landed commits
    ExtractCommitDetails,

    /// Rebuild the curated tables from today's landing state
    BuildCurated,

    /// Mirror curated file blobs into object storage
    ExtractBlobs,

    /// Run all stages in dependency order
    RunAll {
        /// Number of repositories to collect
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env()?.with_verbose(cli.verbose);
    init_logging(&log_config)?;

    let config = Config::load()?;
    let client = GithubClient::new(&config.github)?;
    let store = PgLakeStore::connect(&config.database_url).await?;
    let today = Utc::now().date_naive();

    match cli.stage {
        Stage::DiscoverRepos {
            limit,
            created_after,
            pushed_after,
        } => {
            store.init_schema().await?;
            let options = DiscoveryOptions {
                created_after,
                pushed_after,
            };
            let limit = limit.unwrap_or(config.pipeline.discovery_limit);
            repos::run(&client, &store, &config.pipeline, limit, &options, today).await?;
        }
        Stage::ExtractCommits { limit, since, until } => {
            store.init_schema().await?;
            let window = CommitWindow { since, until };
            let limit = limit.unwrap_or(config.pipeline.commit_limit);
            commits::run(&client, &store, limit, &window, today).await?;
        }
        Stage::ExtractCommitDetails => {
            store.init_schema().await?;
            commit_details::run(&client, &store, config.pipeline.detail_concurrency, today)
                .await?;
        }
        Stage::BuildCurated => {
            curated::build(&store).await?;
        }
        Stage::ExtractBlobs => {
            let storage = S3Storage::new(config.storage.clone());
            blobs::run(&client, &store, &storage, &config.pipeline, today).await?;
        }
        Stage::RunAll { limit } => {
            let storage = S3Storage::new(config.storage.clone());
            let mut config = config;
            if let Some(limit) = limit {
                config.pipeline.discovery_limit = limit;
            }
            pipeline::run_all(
                &client,
                &store,
                &storage,
                &config,
                &DiscoveryOptions::default(),
                &CommitWindow::default(),
                today,
            )
            .await?;
        }
    }

    info!("Done");
    Ok(())
}
