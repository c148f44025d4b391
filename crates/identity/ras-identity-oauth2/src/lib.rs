//! OpenID Connect identity provider implementation.
//!
//! This crate drives the Authorization Code flow against a provider described
//! by its discovery document: the browser is sent to the authorization
//! endpoint, the returned code is exchanged at the token endpoint with the
//! client's credentials, and the userinfo profile becomes the session
//! identity once its email verification claim checks out.

mod authenticator;
mod client;
mod config;
mod discovery;
mod error;
mod types;


pub use authenticator::{CodeAuthenticator, UNVERIFIED_MESSAGE};
pub use client::OAuth2Client;
pub use config::{
    GOOGLE_DISCOVERY_URL, GOOGLE_LOGOUT_URL, OAuth2Config, OAuth2ProviderConfig, OAuth2Routes,
};
pub use discovery::{DiscoveryCache, DiscoveryClient};
pub use error::{OAuth2Error, OAuth2Result};
pub use types::{ProviderMetadata, TokenResponse};

// Re-export common types for convenience
pub use ras_identity_core::{Authenticator, Identity, Outcome};
