//! Binding incoming requests to their client's session.

use crate::cookie::SessionCookieCodec;
use crate::store::SessionStore;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ras_identity_core::{Identity, IdentityResult, SessionSlot};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign session cookies. Must not be empty.
    pub secret: String,
    pub ttl: Duration,
    pub cookie_name: String,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(24),
            cookie_name: "session".to_string(),
            secure_cookie: false,
        }
    }
}

/// What the response must do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    Unchanged,
    /// Set the cookie to this signed value.
    Set(String),
    Remove,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    codec: SessionCookieCodec,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig, store: Arc<dyn SessionStore>) -> SessionResult<Self> {
        if config.secret.is_empty() {
            return Err(SessionError::InvalidConfig(
                "session secret must not be empty".to_string(),
            ));
        }
        if config.ttl <= Duration::zero() {
            return Err(SessionError::InvalidConfig(
                "session ttl must be positive".to_string(),
            ));
        }

        let codec = SessionCookieCodec::new(&config.secret, config.ttl);
        Ok(Self {
            store,
            codec,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a background task evicting expired sessions every `period`.
    ///
    /// Clients that never come back are otherwise only dropped when their
    /// session id is loaded again.
    pub fn spawn_cleanup(&self, period: std::time::Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match store.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => debug!("Evicted {} expired sessions", removed),
                    Err(e) => warn!("Session cleanup failed: {}", e),
                }
            }
        })
    }

    /// Binds a request carrying `cookie_value` (if any) to its session.
    ///
    /// A missing, forged or expired cookie yields an anonymous session.
    pub fn bind(&self, cookie_value: Option<&str>) -> ClientSession {
        let existing = cookie_value.and_then(|value| match self.codec.decode(value) {
            Ok(sid) => Some(sid),
            Err(e) => {
                debug!("Ignoring invalid session cookie: {}", e);
                None
            }
        });

        ClientSession {
            store: self.store.clone(),
            codec: self.codec.clone(),
            had_cookie: existing.is_some(),
            state: Mutex::new(BindingState {
                sid: existing,
                change: Change::None,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    None,
    Issued,
    Cleared,
}

struct BindingState {
    sid: Option<String>,
    change: Change,
}

/// One client's session for the duration of a request.
pub struct ClientSession {
    store: Arc<dyn SessionStore>,
    codec: SessionCookieCodec,
    had_cookie: bool,
    state: Mutex<BindingState>,
}

impl ClientSession {
    fn lock(&self) -> IdentityResult<std::sync::MutexGuard<'_, BindingState>> {
        self.state.lock().map_err(|_| {
            SessionError::StoreError("session binding lock poisoned".to_string()).into()
        })
    }

    fn current_sid(&self) -> IdentityResult<Option<String>> {
        Ok(self.lock()?.sid.clone())
    }

    /// Cookie change the response has to carry after the request was handled.
    pub fn cookie_update(&self) -> SessionResult<CookieUpdate> {
        let state = self
            .state
            .lock()
            .map_err(|_| SessionError::StoreError("session binding lock poisoned".to_string()))?;

        match (state.change, &state.sid) {
            (Change::Issued, Some(sid)) => Ok(CookieUpdate::Set(self.codec.encode(sid)?)),
            (Change::Cleared, _) if self.had_cookie => Ok(CookieUpdate::Remove),
            _ => Ok(CookieUpdate::Unchanged),
        }
    }
}

#[async_trait]
impl SessionSlot for ClientSession {
    async fn load(&self) -> IdentityResult<Option<Identity>> {
        match self.current_sid()? {
            Some(sid) => Ok(self.store.load(&sid).await?),
            None => Ok(None),
        }
    }

    /// Stores under a freshly minted session id so an identity is never
    /// attached to an id the client presented before logging in.
    async fn store(&self, identity: Identity) -> IdentityResult<()> {
        let previous = self.current_sid()?;
        let sid = Uuid::new_v4().to_string();
        let expires_at = self.codec.expiry_from(Utc::now());

        self.store.save(&sid, identity, expires_at).await?;
        if let Some(previous) = previous {
            self.store.remove(&previous).await?;
        }

        let mut state = self.lock()?;
        state.sid = Some(sid);
        state.change = Change::Issued;
        Ok(())
    }

    async fn clear(&self) -> IdentityResult<()> {
        if let Some(sid) = self.current_sid()? {
            self.store.remove(&sid).await?;
        }

        let mut state = self.lock()?;
        state.sid = None;
        state.change = Change::Cleared;
        Ok(())
    }
}
