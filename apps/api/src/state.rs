use std::sync::Arc;

use crate::matching::orchestrator::MatchOrchestrator;

/// Shared application state injected into all route handlers via Axum
/// extractors. The orchestrator is built once at startup with its cache,
/// store, and scoring engine injected; nothing here mutates afterwards.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<MatchOrchestrator>,
}
