//! Shared test doubles for pipeline integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use gitlake_common::{GitLakeError, Result};
use gitlake_ingest::config::GithubConfig;
use gitlake_ingest::github::GithubClient;
use gitlake_ingest::storage::{ObjectStore, UploadResult};
use gitlake_ingest::store::{CommitRef, CuratedFileRow, LakeStore, RawRecord};

/// Client pointed at a wiremock server.
pub fn client_for(server: &wiremock::MockServer) -> GithubClient {
    GithubClient::new(&GithubConfig::for_base_url("test-token", server.uri())).unwrap()
}

/// In-memory lakehouse store keyed exactly like the landing tables:
/// `(table, id, ingestion_date)`.
#[derive(Default)]
pub struct MemoryLakeStore {
    rows: Mutex<BTreeMap<(String, String, NaiveDate), Value>>,
    statements: Mutex<Vec<String>>,
    curated: Mutex<Vec<CuratedFileRow>>,
    fail_upserts: AtomicBool,
}

impl MemoryLakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_curated_files(files: Vec<CuratedFileRow>) -> Self {
        let store = Self::default();
        *store.curated.lock().unwrap() = files;
        store
    }

    /// Number of logical rows landed in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(t, _, _)| t == table)
            .count()
    }

    pub fn payload(&self, table: &str, id: &str, date: NaiveDate) -> Option<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(&(table.to_string(), id.to_string(), date))
            .cloned()
    }

    /// Every statement passed to `execute`, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    /// Make every subsequent `upsert_raw` fail like a lost database.
    pub fn fail_upserts(&self) {
        self.fail_upserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LakeStore for MemoryLakeStore {
    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_raw(&self, table: &str, rows: &[RawRecord], date: NaiveDate) -> Result<u64> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(GitLakeError::Database("connection refused".to_string()));
        }
        let mut guard = self.rows.lock().unwrap();
        for row in rows {
            guard.insert(
                (table.to_string(), row.id.clone(), date),
                row.payload.clone(),
            );
        }
        Ok(rows.len() as u64)
    }

    async fn repo_ids(&self, date: NaiveDate) -> Result<Vec<String>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(t, _, d)| t == "landing.repositories" && *d == date)
            .map(|(_, id, _)| id.clone())
            .collect())
    }

    async fn commit_refs(&self, date: NaiveDate) -> Result<Vec<CommitRef>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|((t, _, d), _)| t == "landing.commits" && *d == date)
            .filter_map(|((_, id, _), payload)| {
                let owner = payload.get("owner")?.as_str()?;
                let repo = payload.get("repo")?.as_str()?;
                Some(CommitRef {
                    sha: id.clone(),
                    repo_id: format!("{}/{}", owner, repo),
                })
            })
            .collect())
    }

    async fn curated_files(&self, _date: NaiveDate) -> Result<Vec<CuratedFileRow>> {
        Ok(self.curated.lock().unwrap().clone())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(())
    }
}

/// In-memory object store recording uploaded blobs by key.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<UploadResult> {
        let size = data.len() as i64;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(UploadResult {
            key: key.to_string(),
            checksum: String::new(),
            size,
        })
    }
}
