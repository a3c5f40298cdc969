mod config;
mod db;
mod errors;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::matching::cache::RedisMatchCache;
use crate::matching::model::ModelArtifacts;
use crate::matching::orchestrator::MatchOrchestrator;
use crate::matching::scoring::ScoringEngine;
use crate::matching::store::PgMatchStore;
use crate::matching::training;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (errors on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting match API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Resolve model artifacts once; the engine owns them read-only for the
    // life of the process. Every failure here degrades to rule-based
    // scoring rather than aborting startup.
    let artifacts = load_or_bootstrap_artifacts(&config);

    let engine = Arc::new(ScoringEngine::new(artifacts, config.force_rule_based));
    info!("Scoring engine ready (method: {})", engine.method().as_str());

    let cache = Arc::new(RedisMatchCache::new(redis));
    let store = Arc::new(PgMatchStore::new(pool));
    let orchestrator = Arc::new(MatchOrchestrator::new(engine, cache, store));

    // Build app state
    let state = AppState { orchestrator };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Loads persisted artifacts, bootstraps them from synthetic labels when
/// none exist, and returns `None` (rule-based fallback) when both fail.
fn load_or_bootstrap_artifacts(config: &Config) -> Option<ModelArtifacts> {
    if config.force_rule_based {
        info!("Rule-based scoring forced by configuration");
        return None;
    }

    if ModelArtifacts::exists(&config.model_dir) {
        match ModelArtifacts::load(&config.model_dir) {
            Ok(artifacts) => return Some(artifacts),
            Err(err) => {
                warn!("Failed to load model artifacts, falling back to rule-based scoring: {err:#}");
                return None;
            }
        }
    }

    match training::bootstrap(&config.model_dir) {
        Ok(artifacts) => Some(artifacts),
        Err(err) => {
            warn!("Bootstrap training failed, falling back to rule-based scoring: {err:#}");
            None
        }
    }
}
