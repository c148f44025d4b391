//! OAuth2 error types.

use ras_identity_core::IdentityError;
use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Discovery document request failed: {0}")]
    DiscoveryFailed(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl From<OAuth2Error> for IdentityError {
    fn from(err: OAuth2Error) -> Self {
        match err {
            OAuth2Error::HttpError(e) => IdentityError::Unavailable(e.to_string()),
            OAuth2Error::DiscoveryFailed(msg) => IdentityError::Unavailable(msg),
            OAuth2Error::ConfigError(msg) => IdentityError::ConfigError(msg),
            e @ (OAuth2Error::TokenExchangeFailed(_)
            | OAuth2Error::UserInfoFailed(_)
            | OAuth2Error::CallbackError(_)) => IdentityError::Rejected(e.to_string()),
            other => IdentityError::ProviderError(other.to_string()),
        }
    }
}
