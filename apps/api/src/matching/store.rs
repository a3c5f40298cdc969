//! Record access behind a seam. The engine does not own the resume/job
//! schema; it reads whatever parsed payloads the upstream CRUD layer stored
//! and appends immutable analysis rows of its own.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::analysis::AnalysisRecord;

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// The parsed structured payload for a resume, if the record exists.
    async fn load_resume(&self, id: Uuid) -> Result<Option<Value>>;
    /// The structured fields of a job posting, if the record exists.
    async fn load_job(&self, id: Uuid) -> Result<Option<Value>>;
    /// Appends one audit row. Insert-only; there is no update or delete.
    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()>;
}

/// Postgres-backed store used in deployment.
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn load_resume(&self, id: Uuid) -> Result<Option<Value>> {
        let payload: Option<Value> =
            sqlx::query_scalar("SELECT parsed_data FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn load_job(&self, id: Uuid) -> Result<Option<Value>> {
        let payload: Option<Value> =
            sqlx::query_scalar("SELECT row_to_json(j) FROM jobs j WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO match_analyses
                (id, resume_id, job_id, match_score, confidence, method, analysis, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.resume_id)
        .bind(record.job_id)
        .bind(record.match_score)
        .bind(record.confidence)
        .bind(&record.method)
        .bind(&record.analysis)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-process store backing the orchestrator tests.
#[derive(Default)]
pub struct InMemoryMatchStore {
    resumes: Mutex<HashMap<Uuid, Value>>,
    jobs: Mutex<HashMap<Uuid, Value>>,
    analyses: Mutex<Vec<AnalysisRecord>>,
}

#[allow(dead_code)]
impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_resume(&self, id: Uuid, payload: Value) {
        self.resumes.lock().await.insert(id, payload);
    }

    pub async fn put_job(&self, id: Uuid, payload: Value) {
        self.jobs.lock().await.insert(id, payload);
    }

    pub async fn analyses(&self) -> Vec<AnalysisRecord> {
        self.analyses.lock().await.clone()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn load_resume(&self, id: Uuid) -> Result<Option<Value>> {
        Ok(self.resumes.lock().await.get(&id).cloned())
    }

    async fn load_job(&self, id: Uuid) -> Result<Option<Value>> {
        Ok(self.jobs.lock().await.get(&id).cloned())
    }

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        self.analyses.lock().await.push(record.clone());
        Ok(())
    }
}
