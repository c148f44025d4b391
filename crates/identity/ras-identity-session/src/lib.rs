//! Session management binding one verified identity to each client.
//!
//! Identities live server-side in a [`SessionStore`]; the client only holds a
//! signed cookie naming its session id. [`SessionManager::bind`] turns the
//! cookie of an incoming request into a [`ClientSession`], which is the
//! [`SessionSlot`](ras_identity_core::SessionSlot) handed to authenticators.

mod binder;
mod cookie;
mod store;

pub use binder::{ClientSession, CookieUpdate, SessionConfig, SessionManager};
pub use cookie::{SessionClaims, SessionCookieCodec};
pub use store::{InMemorySessionStore, SessionStore};

use ras_identity_core::IdentityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Session store error: {0}")]
    StoreError(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for IdentityError {
    fn from(err: SessionError) -> Self {
        IdentityError::SessionError(err.to_string())
    }
}
