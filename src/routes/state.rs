use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::RatingSession,
    services::{sources::RestaurantSource, Catalog, RecommendationEngine},
};

/// Issues a catalog version: wall-clock microseconds, strictly increasing per state
///
/// Recommendation cache keys embed the version, so it must not repeat across
/// restarts or across instances sharing one Redis.
fn next_version(last: &AtomicU64) -> u64 {
    let now = Utc::now().timestamp_micros().max(0) as u64;
    let bump = |prev: u64| now.max(prev + 1);
    match last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(bump(prev))) {
        Ok(prev) | Err(prev) => bump(prev),
    }
}

/// Shared application state
pub struct AppState {
    source: Arc<dyn RestaurantSource>,
    catalog: RwLock<Arc<Catalog>>,
    last_version: AtomicU64,
    pub engine: RecommendationEngine,
    sessions: RwLock<HashMap<Uuid, RatingSession>>,
    session_ttl: Duration,
}

impl AppState {
    /// Loads the initial catalog from the source
    pub async fn new(
        source: Arc<dyn RestaurantSource>,
        engine: RecommendationEngine,
        session_ttl_secs: u64,
    ) -> AppResult<Self> {
        let last_version = AtomicU64::new(0);
        let catalog = Catalog::load(source.as_ref(), next_version(&last_version)).await?;
        Ok(Self {
            source,
            catalog: RwLock::new(Arc::new(catalog)),
            last_version,
            engine,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::seconds(session_ttl_secs.min(i64::MAX as u64) as i64),
        })
    }

    /// Current catalog snapshot
    pub async fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().await.clone()
    }

    /// Reloads the catalog from the source under a new version
    ///
    /// Cached recommendations are keyed by version, so older entries stop matching.
    pub async fn reload_catalog(&self) -> AppResult<Arc<Catalog>> {
        let version = next_version(&self.last_version);
        let catalog = Arc::new(Catalog::load(self.source.as_ref(), version).await?);
        *self.catalog.write().await = catalog.clone();
        Ok(catalog)
    }

    /// Stores a new session, pruning expired ones first
    pub async fn insert_session(&self, session: RatingSession) -> RatingSession {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.session_ttl, now));
        if sessions.len() < before {
            tracing::debug!(pruned = before - sessions.len(), "Pruned expired sessions");
        }
        sessions.insert(session.id, session.clone());
        session
    }

    /// Runs `f` against a live session and returns its result
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut RatingSession) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .filter(|s| !s.is_expired(self.session_ttl, Utc::now()))
            .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))?;
        f(session)
    }

    pub async fn session(&self, id: Uuid) -> AppResult<RatingSession> {
        self.with_session(id, |s| Ok(s.clone())).await
    }

    pub async fn remove_session(&self, id: Uuid) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {}", id)))
    }
}
