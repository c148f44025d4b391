//! CAS error types.

use ras_identity_core::IdentityError;
use thiserror::Error;

pub type CasResult<T> = Result<T, CasError>;

#[derive(Debug, Error)]
pub enum CasError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Undecodable validation response (HTTP {status}): {reason}")]
    InvalidResponse { status: u16, reason: String },
}

impl From<CasError> for IdentityError {
    fn from(err: CasError) -> Self {
        match err {
            CasError::HttpError(e) => IdentityError::Unavailable(e.to_string()),
            CasError::ConfigError(msg) => IdentityError::ConfigError(msg),
            other => IdentityError::ProviderError(other.to_string()),
        }
    }
}
