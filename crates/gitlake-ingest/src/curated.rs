//! Curated layer builder
//!
//! Rebuilds each curated table from its landing table in one declarative
//! pass. The replacement is constructed under a temporary name from a single
//! `CREATE TABLE AS SELECT`, then swapped in atomically, so the old table
//! stays queryable until the new one is complete and there is never a window
//! with no curated table present.
//!
//! Missing JSON fields project as NULL; a failed cast aborts the whole build
//! and propagates — nothing is caught here, the orchestrator must not run
//! blob extraction against stale curated data.

use tracing::info;

use gitlake_common::Result;

use crate::store::LakeStore;

/// Curated projection of per-commit file changes.
///
/// `file_format` is the id substring after the first `.`; `storage_path` is
/// the blob object key under its bucket, with path separators normalized the
/// same way blob extraction normalizes them.
const SELECT_COMMIT_FILES: &str = "\
    SELECT
        id,
        ingestion_date,
        raw_payload->>'repo_id' AS repo_id,
        raw_payload->>'commit_sha' AS commit_sha,
        raw_payload->>'sha' AS blob_sha,
        raw_payload->>'filename' AS file_path,
        raw_payload->>'status' AS status,
        CAST(raw_payload->>'additions' AS INTEGER) AS lines_added,
        CAST(raw_payload->>'deletions' AS INTEGER) AS lines_removed,
        CAST(raw_payload->>'changes' AS INTEGER) AS total_changes,
        SUBSTR(id, STRPOS(id, '.') + 1) AS file_format,
        'repositories/'
            || REPLACE(raw_payload->>'repo_id', '/', '_')
            || '/' || (raw_payload->>'commit_sha')
            || '/' || REPLACE(raw_payload->>'filename', '/', '_') AS storage_path
    FROM landing.commit_files";

/// Per-commit aggregate of the same landing rows.
const SELECT_COMMIT_CHANGE_METRICS: &str = "\
    SELECT
        repo_id,
        commit_sha,
        COUNT(*) AS number_of_files_changed,
        SUM(lines_added + lines_removed) AS total_lines_changed,
        ARRAY_AGG(DISTINCT file_format) AS file_types_changed
    FROM (
        SELECT
            raw_payload->>'repo_id' AS repo_id,
            raw_payload->>'commit_sha' AS commit_sha,
            CAST(raw_payload->>'additions' AS INTEGER) AS lines_added,
            CAST(raw_payload->>'deletions' AS INTEGER) AS lines_removed,
            SUBSTR(id, STRPOS(id, '.') + 1) AS file_format
        FROM landing.commit_files
    ) changed_files
    GROUP BY repo_id, commit_sha";

/// Direct field projection of landed commits.
const SELECT_COMMITS: &str = "\
    SELECT
        raw_payload->>'sha' AS commit_sha,
        raw_payload#>>'{commit,author,name}' AS author_name,
        raw_payload#>>'{commit,author,email}' AS author_email,
        raw_payload#>>'{commit,message}' AS message,
        raw_payload#>>'{commit,author,date}' AS \"timestamp\",
        raw_payload->>'owner' AS owner,
        raw_payload->>'repo' AS repo,
        raw_payload#>>'{parents,0,sha}' AS parent_sha,
        ingestion_date
    FROM landing.commits";

/// Curated tables in build order: `(table name, projection)`.
const CURATED_TABLES: [(&str, &str); 3] = [
    ("commit_files", SELECT_COMMIT_FILES),
    ("commit_change_metrics", SELECT_COMMIT_CHANGE_METRICS),
    ("commits", SELECT_COMMITS),
];

/// Rebuild every curated table from today's landing state.
///
/// Must run only after the day's landing writes for commits and commit files
/// are complete; the pipeline enforces that ordering.
pub async fn build(store: &dyn LakeStore) -> Result<()> {
    store.execute("CREATE SCHEMA IF NOT EXISTS curated").await?;

    for (table, select) in CURATED_TABLES {
        rebuild_table(store, table, select).await?;
        info!(table = table, "Rebuilt curated table");
    }

    Ok(())
}

/// Build `curated.{table}` under a `_new` name, then swap it in atomically.
async fn rebuild_table(store: &dyn LakeStore, table: &str, select: &str) -> Result<()> {
    // A leftover temp table from an aborted run is stale; clear it first.
    store
        .execute(&format!("DROP TABLE IF EXISTS curated.{}_new", table))
        .await?;

    store
        .execute(&format!("CREATE TABLE curated.{}_new AS {}", table, select))
        .await?;

    // Single statement batch: Postgres runs it in one implicit transaction,
    // so the old table is either still present or already replaced.
    store
        .execute(&format!(
            "DROP TABLE IF EXISTS curated.{table}; \
             ALTER TABLE curated.{table}_new RENAME TO {table};",
            table = table
        ))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_files_projection_derives_format_and_storage_path() {
        assert!(SELECT_COMMIT_FILES.contains("SUBSTR(id, STRPOS(id, '.') + 1) AS file_format"));
        assert!(SELECT_COMMIT_FILES.contains("'repositories/'"));
        assert!(SELECT_COMMIT_FILES.contains("REPLACE(raw_payload->>'filename', '/', '_')"));
    }

    #[test]
    fn metrics_aggregate_by_repo_and_commit() {
        assert!(SELECT_COMMIT_CHANGE_METRICS.contains("GROUP BY repo_id, commit_sha"));
        assert!(SELECT_COMMIT_CHANGE_METRICS
            .contains("SUM(lines_added + lines_removed) AS total_lines_changed"));
    }
}
