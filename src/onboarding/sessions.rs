//! In-memory registry of live onboarding sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::manager::{OnboardingSession, OnboardingStatus};
use super::prompts::ResponseCatalog;
use crate::error::OnboardingError;

/// Holds every active session, keyed by ID. Nothing is persisted: dropping a
/// session (or restarting the process) discards its answers.
pub struct SessionRegistry {
    catalog: Arc<dyn ResponseCatalog>,
    sessions: RwLock<HashMap<Uuid, Arc<OnboardingSession>>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<dyn ResponseCatalog>, idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Create a session and render its welcome message.
    pub async fn create(&self) -> Result<Arc<OnboardingSession>, OnboardingError> {
        let session = Arc::new(OnboardingSession::new(Arc::clone(&self.catalog)));
        session.start().await?;

        let id = session.id();
        self.sessions.write().await.insert(id, Arc::clone(&session));
        info!(session_id = %id, "Onboarding session created");
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<OnboardingSession>, OnboardingError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(OnboardingError::SessionNotFound { id })
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Onboarding session removed");
        }
        removed
    }

    /// Status of every live session, in no particular order.
    pub async fn statuses(&self) -> Vec<OnboardingStatus> {
        let sessions: Vec<Arc<OnboardingSession>> =
            self.sessions.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            out.push(session.status().await);
        }
        out
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle for longer than the configured timeout.
    /// Returns how many were removed.
    pub async fn prune_idle(&self) -> usize {
        let snapshot: Vec<Arc<OnboardingSession>> =
            self.sessions.read().await.values().cloned().collect();

        let mut stale = Vec::new();
        for session in snapshot {
            if session.idle_for().await > self.idle_timeout {
                stale.push(session.id());
            }
        }
        if stale.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &stale {
            sessions.remove(id);
            debug!(session_id = %id, "Pruned idle onboarding session");
        }
        info!(count = stale.len(), "Pruned idle onboarding sessions");
        stale.len()
    }
}

/// Spawn a background task that prunes idle sessions every `interval`.
pub fn spawn_prune_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.prune_idle().await;
        }
    })
}
