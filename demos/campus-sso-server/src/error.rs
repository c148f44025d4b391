//! HTTP mapping of authentication failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ras_identity_core::IdentityError;
use ras_identity_session::SessionError;
use tracing::{error, warn};

/// Error returned by route handlers. Details stay in the logs; the client
/// gets a short fixed message.
#[derive(Debug)]
pub struct AppError(pub IdentityError);

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        Self(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self(err.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IdentityError::Rejected(_) => StatusCode::UNAUTHORIZED,
            IdentityError::Unavailable(_)
            | IdentityError::ProviderError(_)
            | IdentityError::SerializationError(_) => StatusCode::BAD_GATEWAY,
            IdentityError::SessionError(_) | IdentityError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::UNAUTHORIZED => {
                warn!("Authentication rejected: {}", self.0);
                "Authentication failed"
            }
            StatusCode::BAD_GATEWAY => {
                error!("Identity provider error: {}", self.0);
                "Identity provider unavailable"
            }
            _ => {
                error!("Internal authentication error: {}", self.0);
                "Internal server error"
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                IdentityError::Rejected("invalid_grant".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                IdentityError::Unavailable("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                IdentityError::ProviderError("bad token type".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                IdentityError::SessionError("store down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IdentityError::ConfigError("no origin".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_body_hides_details() {
        let response = AppError(IdentityError::Rejected("code=secret123".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Authentication failed");
    }
}
