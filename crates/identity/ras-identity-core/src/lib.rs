//! Core contract for redirect-driven external identity authentication.
//!
//! An [`Authenticator`] turns an anonymous request into an authenticated
//! session by delegating credential checks to an external identity provider.
//! Every operation receives an explicit [`AuthContext`] and answers with an
//! [`Outcome`]: either the identity bound to the session, or a terminal
//! redirect/denial the caller must return without further processing.

mod authenticator;
mod context;
mod identity;

pub use authenticator::{AuthRoute, Authenticator, LogoutPolicy, LogoutScope, RouteAction};
pub use context::{AuthContext, MemorySlot, SessionSlot};
pub use identity::{Identity, Outcome};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider rejected credential: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
