//! The engine's public entry point. Checks the cache, loads the pair,
//! extracts features, scores, persists one audit row, writes the cache.
//!
//! No exception escapes `compute_match`; every failure mode is folded into
//! the typed result. There is deliberately no single-flight lock: two
//! concurrent misses for the same pair may both compute and both persist,
//! last write wins on the cache.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::matching::cache::MatchCache;
use crate::matching::features::{extract_job, extract_resume};
use crate::matching::scoring::{MatchAnalysis, MatchResult, ScoringEngine};
use crate::matching::store::MatchStore;
use crate::models::analysis::AnalysisRecord;

pub struct MatchOrchestrator {
    engine: Arc<ScoringEngine>,
    cache: Arc<dyn MatchCache>,
    store: Arc<dyn MatchStore>,
}

impl MatchOrchestrator {
    pub fn new(
        engine: Arc<ScoringEngine>,
        cache: Arc<dyn MatchCache>,
        store: Arc<dyn MatchStore>,
    ) -> Self {
        Self {
            engine,
            cache,
            store,
        }
    }

    /// Computes (or serves from cache) the match result for a pair.
    /// Existence and authorization checks on the ids are the caller's
    /// responsibility; a record missing at this point is a scoring failure,
    /// not a panic or an HTTP error.
    pub async fn compute_match(&self, resume_id: Uuid, job_id: Uuid) -> MatchResult {
        let started = Instant::now();

        if let Some(mut hit) = self.cache.get(resume_id, job_id).await {
            debug!("Cache hit for pair ({resume_id}, {job_id})");
            hit.cached = true;
            return hit;
        }

        let resume_payload = match self.store.load_resume(resume_id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                return failure(started, format!("resume {resume_id} not found"));
            }
            Err(err) => {
                error!("Loading resume {resume_id} failed: {err:#}");
                return failure(started, format!("failed to load resume {resume_id}"));
            }
        };
        let job_payload = match self.store.load_job(job_id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                return failure(started, format!("job {job_id} not found"));
            }
            Err(err) => {
                error!("Loading job {job_id} failed: {err:#}");
                return failure(started, format!("failed to load job {job_id}"));
            }
        };

        let resume = extract_resume(&resume_payload);
        let job = extract_job(&job_payload);
        let result = self.engine.score(&resume, &job);

        if result.success {
            let record = AnalysisRecord::from_result(resume_id, job_id, &result);
            if let Err(err) = self.store.insert_analysis(&record).await {
                // Skip the cache write so the next call recomputes and gets
                // another chance to leave an audit row.
                error!("Persisting analysis for ({resume_id}, {job_id}) failed: {err:#}");
                return result;
            }
            self.cache.put(resume_id, job_id, &result).await;
            info!(
                "Scored pair ({resume_id}, {job_id}): {:.1} via {}",
                result.match_score,
                result.method.as_str()
            );
        }

        result
    }

    /// Direct cache read; `None` on miss or expiry.
    pub async fn get_cached(&self, resume_id: Uuid, job_id: Uuid) -> Option<MatchResult> {
        let mut hit = self.cache.get(resume_id, job_id).await?;
        hit.cached = true;
        Some(hit)
    }

    /// Drops the cached entry for one pair so the next compute recomputes.
    pub async fn invalidate(&self, resume_id: Uuid, job_id: Uuid) {
        self.cache.invalidate(Some(resume_id), Some(job_id)).await;
    }
}

fn failure(started: Instant, error: String) -> MatchResult {
    MatchResult {
        success: false,
        match_score: 0.0,
        confidence: 0.0,
        method: crate::matching::scoring::MatchMethod::RuleBased,
        analysis: MatchAnalysis::default(),
        processing_time: started.elapsed().as_secs_f64(),
        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        cached: false,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::cache::InMemoryMatchCache;
    use crate::matching::store::InMemoryMatchStore;
    use serde_json::json;

    struct Fixture {
        orchestrator: MatchOrchestrator,
        store: Arc<InMemoryMatchStore>,
        resume_id: Uuid,
        job_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let engine = Arc::new(ScoringEngine::new(None, false));
        let cache = Arc::new(InMemoryMatchCache::new());
        let store = Arc::new(InMemoryMatchStore::new());

        let resume_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        store
            .put_resume(
                resume_id,
                json!({
                    "skills": ["python", "django", "react"],
                    "experience_level": "senior",
                    "total_experience_years": 7,
                    "education": "bachelor",
                    "location": "new york",
                    "parsed_text": "senior python django engineer"
                }),
            )
            .await;
        store
            .put_job(
                job_id,
                json!({
                    "title": "Backend Engineer",
                    "description": "python django services",
                    "skills_required": "Python, Django, Vue.js",
                    "experience_level": "senior",
                    "location": "new york",
                    "remote_allowed": false
                }),
            )
            .await;

        let orchestrator =
            MatchOrchestrator::new(engine, cache, store.clone() as Arc<dyn MatchStore>);
        Fixture {
            orchestrator,
            store,
            resume_id,
            job_id,
        }
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let f = fixture().await;

        let first = f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        assert!(first.success);
        assert!(!first.cached);

        let second = f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        assert!(second.cached);
        assert_eq!(second.match_score, first.match_score);
        assert_eq!(second.analysis, first.analysis);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_persist_a_second_record() {
        let f = fixture().await;

        f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        f.orchestrator.compute_match(f.resume_id, f.job_id).await;

        assert_eq!(f.store.analyses().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute_and_new_record() {
        let f = fixture().await;

        f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        assert!(f.orchestrator.get_cached(f.resume_id, f.job_id).await.is_some());

        f.orchestrator.invalidate(f.resume_id, f.job_id).await;
        assert!(f.orchestrator.get_cached(f.resume_id, f.job_id).await.is_none());

        let recomputed = f.orchestrator.compute_match(f.resume_id, f.job_id).await;
        assert!(!recomputed.cached);
        assert_eq!(f.store.analyses().await.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_resume_yields_unsuccessful_result() {
        let f = fixture().await;
        let unknown = Uuid::new_v4();

        let result = f.orchestrator.compute_match(unknown, f.job_id).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("not found"));
        // Failures persist nothing and cache nothing.
        assert!(f.store.analyses().await.is_empty());
        assert!(f.orchestrator.get_cached(unknown, f.job_id).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_job_yields_unsuccessful_result() {
        let f = fixture().await;
        let unknown = Uuid::new_v4();

        let result = f.orchestrator.compute_match(f.resume_id, unknown).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("not found"));
    }

    #[tokio::test]
    async fn test_get_cached_marks_result_as_cached() {
        let f = fixture().await;
        f.orchestrator.compute_match(f.resume_id, f.job_id).await;

        let cached = f.orchestrator.get_cached(f.resume_id, f.job_id).await.unwrap();
        assert!(cached.cached);
        assert!(cached.success);
    }

    #[tokio::test]
    async fn test_reversed_pair_is_an_independent_cache_entry() {
        let f = fixture().await;
        f.orchestrator.compute_match(f.resume_id, f.job_id).await;

        // The reversed pair was never computed; its cache slot is empty.
        assert!(f.orchestrator.get_cached(f.job_id, f.resume_id).await.is_none());
    }
}
