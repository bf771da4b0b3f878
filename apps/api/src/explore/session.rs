use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::explore::controller::{Clock, ExploreController};
use crate::search_client::SearchBackend;

struct SessionEntry {
    controller: Arc<ExploreController>,
    last_access: DateTime<Utc>,
}

/// In-memory registry of live Explore sessions.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    backend: Arc<dyn SearchBackend>,
    clock: Arc<dyn Clock>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SearchBackend>, clock: Arc<dyn Clock>, idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            backend,
            clock,
            idle_ttl,
        }
    }

    pub fn create(&self, seed_query: Option<&str>) -> Arc<ExploreController> {
        let id = Uuid::new_v4();
        let controller = Arc::new(ExploreController::new(
            id,
            self.backend.clone(),
            self.clock.clone(),
            seed_query,
        ));
        self.sessions.write().insert(
            id,
            SessionEntry {
                controller: controller.clone(),
                last_access: self.clock.now(),
            },
        );
        info!(session = %id, seeded = seed_query.is_some(), "explore session created");
        controller
    }

    /// Looks up a session and refreshes its idle timer.
    pub fn get(&self, id: Uuid) -> Option<Arc<ExploreController>> {
        let mut sessions = self.sessions.write();
        let entry = sessions.get_mut(&id)?;
        entry.last_access = self.clock.now();
        Some(entry.controller.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().remove(&id);
        match removed {
            Some(entry) => {
                entry.controller.teardown();
                info!(session = %id, "explore session closed");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Tears down and drops sessions idle for longer than the TTL, along with
    /// any that were already torn down.
    pub fn evict_idle(&self) -> usize {
        let cutoff = self.clock.now() - self.idle_ttl;
        let expired: Vec<SessionEntry> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| entry.last_access < cutoff || !entry.controller.is_alive())
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for entry in &expired {
            entry.controller.teardown();
        }
        if !expired.is_empty() {
            info!(evicted = expired.len(), remaining = self.session_count(), "idle explore sessions evicted");
        }
        expired.len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.evict_idle();
            }
        })
    }
}
