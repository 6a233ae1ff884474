//! Per-user explorer sessions keyed by id

use chrono::{DateTime, Duration, Utc};
use lje_common::ExplorerSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

struct Entry {
    session: ExplorerSession,
    last_used: DateTime<Utc>,
}

type SharedEntry = Arc<Mutex<Entry>>;

/// Shared map of open sessions
///
/// The map lock is held only to look a session up; commands run under the
/// session's own lock, so one session never waits on another.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedEntry>>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Register a session, evicting sessions idle past the timeout first
    ///
    /// A session busy with a command is never evicted.
    pub async fn insert(&self, session: ExplorerSession) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => now - entry.last_used <= self.idle_timeout,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "evicted idle sessions");
        }

        sessions.insert(
            id,
            Arc::new(Mutex::new(Entry {
                session,
                last_used: now,
            })),
        );
        id
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, id: Uuid) -> ApiResult<SharedEntry> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Session {}", id)))
    }

    /// Run one in-memory command against session `id`
    pub async fn with_session<R, F>(&self, id: Uuid, command: F) -> ApiResult<R>
    where
        F: FnOnce(&mut ExplorerSession) -> R,
    {
        let entry = self.entry(id).await?;
        let mut entry = entry.lock().await;
        entry.last_used = Utc::now();
        Ok(command(&mut entry.session))
    }

    /// Run a command that touches the filesystem on the blocking pool
    pub async fn with_session_blocking<R, F>(&self, id: Uuid, command: F) -> ApiResult<R>
    where
        F: FnOnce(&mut ExplorerSession) -> R + Send + 'static,
        R: Send + 'static,
    {
        let entry = self.entry(id).await?;
        let mut entry = entry.lock_owned().await;
        entry.last_used = Utc::now();
        tokio::task::spawn_blocking(move || command(&mut entry.session))
            .await
            .map_err(|e| ApiError::Internal(format!("Session task failed: {}", e)))
    }
}
