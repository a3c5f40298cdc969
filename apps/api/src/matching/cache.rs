//! Match-result cache. Keyed by the ordered (resume_id, job_id) pair with a
//! fixed TTL; unbounded in size, TTL expiry is the only eviction.
//!
//! A cache failure is never a request failure: errors on the Redis round
//! trip degrade to a miss and are logged.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::matching::scoring::MatchResult;

/// Fixed entry TTL.
pub const CACHE_TTL_SECS: u64 = 3600;

/// The documented key shape. The pair is ordered; (r, j) and (j, r) are
/// distinct entries.
fn cache_key(resume_id: Uuid, job_id: Uuid) -> String {
    format!("match_score:{resume_id}:{job_id}")
}

#[async_trait]
pub trait MatchCache: Send + Sync {
    async fn get(&self, resume_id: Uuid, job_id: Uuid) -> Option<MatchResult>;
    async fn put(&self, resume_id: Uuid, job_id: Uuid, result: &MatchResult);
    /// Removes exactly one entry when both ids are given. Full flush
    /// (neither id) and one-sided invalidation are not implemented; they
    /// log and do nothing.
    async fn invalidate(&self, resume_id: Option<Uuid>, job_id: Option<Uuid>);
}

/// Redis-backed cache used in deployment.
pub struct RedisMatchCache {
    client: redis::Client,
}

impl RedisMatchCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn try_get(&self, key: &str) -> anyhow::Result<Option<MatchResult>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn try_put(&self, key: &str, result: &MatchResult) -> anyhow::Result<()> {
        let payload = serde_json::to_string(result)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, payload, CACHE_TTL_SECS).await?;
        Ok(())
    }

    async fn try_del(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

#[async_trait]
impl MatchCache for RedisMatchCache {
    async fn get(&self, resume_id: Uuid, job_id: Uuid) -> Option<MatchResult> {
        let key = cache_key(resume_id, job_id);
        match self.try_get(&key).await {
            Ok(hit) => hit,
            Err(err) => {
                warn!("Cache read for {key} failed, treating as miss: {err:#}");
                None
            }
        }
    }

    async fn put(&self, resume_id: Uuid, job_id: Uuid, result: &MatchResult) {
        let key = cache_key(resume_id, job_id);
        if let Err(err) = self.try_put(&key, result).await {
            warn!("Cache write for {key} failed: {err:#}");
        }
    }

    async fn invalidate(&self, resume_id: Option<Uuid>, job_id: Option<Uuid>) {
        match (resume_id, job_id) {
            (Some(r), Some(j)) => {
                let key = cache_key(r, j);
                if let Err(err) = self.try_del(&key).await {
                    warn!("Cache invalidation for {key} failed: {err:#}");
                }
            }
            _ => {
                warn!("Partial or full cache invalidation is not implemented; ignoring");
            }
        }
    }
}

/// In-process cache for tests and cache-less local runs. Same TTL contract
/// as the Redis implementation.
#[allow(dead_code)]
pub struct InMemoryMatchCache {
    entries: Mutex<HashMap<(Uuid, Uuid), (MatchResult, Instant)>>,
    ttl: Duration,
}

#[allow(dead_code)]
impl InMemoryMatchCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for InMemoryMatchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchCache for InMemoryMatchCache {
    async fn get(&self, resume_id: Uuid, job_id: Uuid) -> Option<MatchResult> {
        let mut entries = self.entries.lock().await;
        if let Some((result, stored_at)) = entries.get(&(resume_id, job_id)) {
            if stored_at.elapsed() < self.ttl {
                return Some(result.clone());
            }
        }
        // Absent, or present but past TTL.
        entries.remove(&(resume_id, job_id));
        None
    }

    async fn put(&self, resume_id: Uuid, job_id: Uuid, result: &MatchResult) {
        self.entries
            .lock()
            .await
            .insert((resume_id, job_id), (result.clone(), Instant::now()));
    }

    async fn invalidate(&self, resume_id: Option<Uuid>, job_id: Option<Uuid>) {
        match (resume_id, job_id) {
            (Some(r), Some(j)) => {
                self.entries.lock().await.remove(&(r, j));
            }
            _ => {
                warn!("Partial or full cache invalidation is not implemented; ignoring");
            }
        }
    }
}
