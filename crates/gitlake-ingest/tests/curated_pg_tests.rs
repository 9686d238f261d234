//! Curated projection behavior against a real Postgres.
//!
//! The statement-ordering tests cover the swap protocol; these pin what the
//! projections actually produce from malformed landing payloads. Run with
//! `cargo test -- --ignored` when Docker is available.

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use gitlake_common::keys::composite_file_id;
use gitlake_ingest::curated;
use gitlake_ingest::store::{
    LakeStore, PgLakeStore, RawRecord, LANDING_COMMITS, LANDING_COMMIT_FILES,
};

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
}

async fn start_store() -> Result<(ContainerAsync<Postgres>, PgLakeStore, PgPool)> {
    let container = Postgres::default().with_tag("16-alpine").start().await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let conn_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&conn_string)
        .await?;

    let store = PgLakeStore::from_pool(pool.clone());
    store.init_schema().await?;

    Ok((container, store, pool))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn missing_payload_fields_project_as_null() -> Result<()> {
    let (_container, store, pool) = start_store().await?;

    // A landed commit with no sha and no commit object.
    store
        .upsert_raw(
            LANDING_COMMITS,
            &[RawRecord::new(
                "malformed-commit",
                json!({"owner": "octocat", "repo": "hello"}),
            )],
            test_date(),
        )
        .await?;

    // A landed file change with no additions/deletions/changes counters.
    let id = composite_file_id("sha1", "src/lib.rs");
    store
        .upsert_raw(
            LANDING_COMMIT_FILES,
            &[RawRecord::new(
                id.clone(),
                json!({
                    "id": id,
                    "repo_id": "octocat/hello",
                    "commit_sha": "sha1",
                    "filename": "src/lib.rs",
                    "status": "modified",
                }),
            )],
            test_date(),
        )
        .await?;

    curated::build(&store).await?;

    let commit_sha: Option<String> = sqlx::query_scalar("SELECT commit_sha FROM curated.commits")
        .fetch_one(&pool)
        .await?;
    assert_eq!(commit_sha, None);

    let author_name: Option<String> = sqlx::query_scalar("SELECT author_name FROM curated.commits")
        .fetch_one(&pool)
        .await?;
    assert_eq!(author_name, None);

    let lines_added: Option<i32> =
        sqlx::query_scalar("SELECT lines_added FROM curated.commit_files WHERE id = $1")
            .bind(&id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(lines_added, None);

    // The well-formed columns of the same row still project.
    let file_path: Option<String> =
        sqlx::query_scalar("SELECT file_path FROM curated.commit_files WHERE id = $1")
            .bind(&id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(file_path.as_deref(), Some("src/lib.rs"));

    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn non_numeric_counter_aborts_the_build() -> Result<()> {
    let (_container, store, _pool) = start_store().await?;

    let id = composite_file_id("sha1", "src/lib.rs");
    store
        .upsert_raw(
            LANDING_COMMIT_FILES,
            &[RawRecord::new(
                id.clone(),
                json!({
                    "id": id,
                    "repo_id": "octocat/hello",
                    "commit_sha": "sha1",
                    "filename": "src/lib.rs",
                    "status": "modified",
                    "additions": "lots",
                    "deletions": 1,
                    "changes": 1,
                }),
            )],
            test_date(),
        )
        .await?;

    assert!(curated::build(&store).await.is_err());

    Ok(())
}
