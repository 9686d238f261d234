//! GitLake Ingest Library
//!
//! Extraction-and-curation pipeline harvesting public GitHub metadata into a
//! lakehouse landing layer, deriving a curated relational layer, and mirroring
//! referenced file blobs into object storage.
//!
//! # Pipeline stages
//!
//! Data flows strictly forward:
//!
//! 1. **Repository discovery** — paginated search for popular repositories,
//!    landed raw, keyed by full name
//! 2. **Commit extraction** — recent commits per discovered repository,
//!    keyed by SHA
//! 3. **Commit detail extraction** — per-file change records per commit,
//!    fetched with bounded parallelism
//! 4. **Curated layer build** — declarative rebuild of the relational
//!    projection from the landing tables
//! 5. **Blob extraction** — file contents at each commit's revision, uploaded
//!    to content-addressed-by-path object keys
//!
//! Every stage operates on today's ingestion-date partition only, so each run
//! is a pure function of the day's slice.
//!
//! # Example
//!
//! ```no_run
//! use gitlake_ingest::{config::Config, github::GithubClient};
//! use gitlake_ingest::store::{LakeStore, PgLakeStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let client = GithubClient::new(&config.github)?;
//!     let store = PgLakeStore::connect(&config.database_url).await?;
//!     store.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod curated;
pub mod extract;
pub mod github;
pub mod pipeline;
pub mod storage;
pub mod store;
