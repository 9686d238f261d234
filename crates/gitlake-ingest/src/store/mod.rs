//! Lakehouse landing/curated store
//!
//! The pipeline talks to the store through the [`LakeStore`] trait so
//! extraction stages can be exercised against an in-memory double. The
//! production implementation runs over a Postgres pool.
//!
//! Landing writes are upserts keyed on `(id, ingestion_date)`: re-ingesting
//! the same entity on the same day replaces its payload instead of appending
//! a duplicate row.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use gitlake_common::{GitLakeError, Result};

/// Landing table for discovered repositories, keyed by full name.
pub const LANDING_REPOSITORIES: &str = "landing.repositories";

/// Landing table for commits, keyed by SHA.
pub const LANDING_COMMITS: &str = "landing.commits";

/// Landing table for per-commit file changes, keyed by composite id.
pub const LANDING_COMMIT_FILES: &str = "landing.commit_files";

/// The only tables raw landing writes may target. Table names are spliced
/// into SQL as identifiers, so they must come from this set.
const LANDING_TABLES: [&str; 3] = [LANDING_REPOSITORIES, LANDING_COMMITS, LANDING_COMMIT_FILES];

/// One raw record headed for a landing table
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Caller-chosen identity: full repo name, commit SHA, or composite id.
    pub id: String,
    /// Opaque source payload.
    pub payload: Value,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// A landed commit, addressed for detail extraction
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CommitRef {
    pub sha: String,
    /// `owner/repo` full name.
    pub repo_id: String,
}

/// A curated commit-file row, addressed for blob extraction
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CuratedFileRow {
    pub id: String,
    pub repo_id: String,
    pub commit_sha: String,
    pub file_path: String,
}

/// Landing and curated table access used by the pipeline stages
#[async_trait]
pub trait LakeStore: Send + Sync {
    /// Create the landing schema and tables if absent.
    async fn init_schema(&self) -> Result<()>;

    /// Idempotently land a batch of raw records for one ingestion date.
    /// Returns the number of rows written.
    async fn upsert_raw(&self, table: &str, rows: &[RawRecord], date: NaiveDate) -> Result<u64>;

    /// Distinct repository full names landed on `date`.
    async fn repo_ids(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// `(sha, owner/repo)` pairs landed on `date`.
    async fn commit_refs(&self, date: NaiveDate) -> Result<Vec<CommitRef>>;

    /// Curated commit-file rows for `date`, the input to blob extraction.
    async fn curated_files(&self, date: NaiveDate) -> Result<Vec<CuratedFileRow>>;

    /// Run DDL/DML verbatim. Used by the curated layer builder.
    async fn execute(&self, sql: &str) -> Result<()>;
}

/// Postgres-backed lakehouse store
#[derive(Clone)]
pub struct PgLakeStore {
    pool: PgPool,
}

impl PgLakeStore {
    /// Connect with a small pool; the pipeline is the only writer.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| GitLakeError::Database(e.to_string()))?;

        info!("Connected to lakehouse store");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn check_landing_table(table: &str) -> Result<()> {
    if LANDING_TABLES.contains(&table) {
        Ok(())
    } else {
        Err(GitLakeError::Database(format!(
            "unknown landing table: {}",
            table
        )))
    }
}

#[async_trait]
impl LakeStore for PgLakeStore {
    async fn init_schema(&self) -> Result<()> {
        let mut statements = vec![
            "CREATE SCHEMA IF NOT EXISTS landing".to_string(),
            "CREATE SCHEMA IF NOT EXISTS curated".to_string(),
        ];
        for table in LANDING_TABLES {
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} ( \
                     id TEXT NOT NULL, \
                     ingestion_date DATE NOT NULL, \
                     raw_payload JSONB NOT NULL, \
                     PRIMARY KEY (id, ingestion_date) \
                 )",
                table
            ));
        }

        for statement in statements {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| GitLakeError::Database(e.to_string()))?;
        }

        debug!("Landing schema ready");
        Ok(())
    }

    async fn upsert_raw(&self, table: &str, rows: &[RawRecord], date: NaiveDate) -> Result<u64> {
        check_landing_table(table)?;

        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} (id, ingestion_date, raw_payload) ",
            table
        ));
        builder.push_values(rows, |mut b, row| {
            b.push_bind(&row.id)
                .push_bind(date)
                .push_bind(&row.payload);
        });
        builder.push(
            " ON CONFLICT (id, ingestion_date) DO UPDATE SET raw_payload = EXCLUDED.raw_payload",
        );

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| GitLakeError::Database(e.to_string()))?;

        debug!(table = table, rows = result.rows_affected(), "Landed batch");

        Ok(result.rows_affected())
    }

    async fn repo_ids(&self, date: NaiveDate) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT id FROM landing.repositories WHERE ingestion_date = $1",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GitLakeError::Database(e.to_string()))?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn commit_refs(&self, date: NaiveDate) -> Result<Vec<CommitRef>> {
        sqlx::query_as(
            "SELECT id AS sha, \
                    (raw_payload->>'owner') || '/' || (raw_payload->>'repo') AS repo_id \
             FROM landing.commits \
             WHERE ingestion_date = $1 \
               AND raw_payload ? 'owner' AND raw_payload ? 'repo'",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GitLakeError::Database(e.to_string()))
    }

    async fn curated_files(&self, date: NaiveDate) -> Result<Vec<CuratedFileRow>> {
        sqlx::query_as(
            "SELECT id, repo_id, commit_sha, file_path \
             FROM curated.commit_files \
             WHERE ingestion_date = $1",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GitLakeError::Database(e.to_string()))
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| GitLakeError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_table_allowlist_rejects_unknown_names() {
        assert!(check_landing_table(LANDING_COMMITS).is_ok());
        assert!(check_landing_table("landing.commits; DROP TABLE x").is_err());
    }
}
