//! Server-side session storage.

use crate::SessionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ras_identity_core::Identity;
use std::sync::Arc;

/// Storage for session identities, keyed by session id.
///
/// Implementations are shared by every request, so they must tolerate
/// concurrent access from different clients.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Identity stored under `sid`, if any and not expired.
    async fn load(&self, sid: &str) -> SessionResult<Option<Identity>>;

    async fn save(
        &self,
        sid: &str,
        identity: Identity,
        expires_at: DateTime<Utc>,
    ) -> SessionResult<()>;

    async fn remove(&self, sid: &str) -> SessionResult<()>;

    /// Drops expired entries and returns how many were removed.
    async fn cleanup_expired(&self) -> SessionResult<usize>;
}

#[derive(Debug, Clone)]
struct StoredSession {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

/// Process-local store. Sessions do not survive a restart.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, sid: &str) -> SessionResult<Option<Identity>> {
        let Some(entry) = self.sessions.get(sid) else {
            return Ok(None);
        };

        if Utc::now() > entry.expires_at {
            drop(entry);
            self.sessions.remove(sid);
            return Ok(None);
        }

        Ok(Some(entry.identity.clone()))
    }

    async fn save(
        &self,
        sid: &str,
        identity: Identity,
        expires_at: DateTime<Utc>,
    ) -> SessionResult<()> {
        self.sessions.insert(
            sid.to_string(),
            StoredSession {
                identity,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, sid: &str) -> SessionResult<()> {
        self.sessions.remove(sid);
        Ok(())
    }

    async fn cleanup_expired(&self) -> SessionResult<usize> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at >= now);
        Ok(before - self.sessions.len())
    }
}
