//! Per-request capability handed to authenticators.

use crate::{Identity, IdentityResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The single identity slot of one client's session.
#[async_trait]
pub trait SessionSlot: Send + Sync {
    async fn load(&self) -> IdentityResult<Option<Identity>>;

    /// Replaces whatever identity the slot held.
    async fn store(&self, identity: Identity) -> IdentityResult<()>;

    /// Empties the slot. Clearing an empty slot is not an error.
    async fn clear(&self) -> IdentityResult<()>;
}

/// Everything an authenticator may look at or change while handling a request.
pub struct AuthContext<'a> {
    current_url: Option<String>,
    query: HashMap<String, String>,
    session: &'a dyn SessionSlot,
}

impl<'a> AuthContext<'a> {
    pub fn new(
        current_url: Option<String>,
        query: HashMap<String, String>,
        session: &'a dyn SessionSlot,
    ) -> Self {
        Self {
            current_url,
            query,
            session,
        }
    }

    /// Absolute URL of the request being handled, query string included.
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// `scheme://host[:port]` of the current URL, when it is absolute.
    pub fn origin(&self) -> Option<String> {
        let parsed = url::Url::parse(self.current_url()?).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn session(&self) -> &dyn SessionSlot {
        self.session
    }
}

/// In-process slot for a single client, for tools and tests that run an
/// authenticator without a cookie-backed session store.
#[derive(Default)]
pub struct MemorySlot {
    identity: RwLock<Option<Identity>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }

    pub async fn snapshot(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }
}

#[async_trait]
impl SessionSlot for MemorySlot {
    async fn load(&self) -> IdentityResult<Option<Identity>> {
        Ok(self.identity.read().await.clone())
    }

    async fn store(&self, identity: Identity) -> IdentityResult<()> {
        *self.identity.write().await = Some(identity);
        Ok(())
    }

    async fn clear(&self) -> IdentityResult<()> {
        self.identity.write().await.take();
        Ok(())
    }
}
