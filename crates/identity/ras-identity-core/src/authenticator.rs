//! The authenticator contract shared by every provider variant.

use crate::{AuthContext, IdentityResult, Outcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which sessions a logout request tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutScope {
    /// Only the local application session.
    App,
    /// The local session and, subject to [`LogoutPolicy`], the provider's.
    Provider,
}

/// Whether a provider logout is allowed to end the user's provider session.
///
/// Ending it also signs the user out of every other application using the
/// same provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutPolicy {
    #[default]
    TerminateProviderSession,
    AppOnly,
}

/// What a provider route does when hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    BeginLogin,
    CompleteLogin,
    Logout(LogoutScope),
}

/// A GET endpoint an authenticator needs mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRoute {
    pub path: String,
    pub action: RouteAction,
}

impl AuthRoute {
    pub fn new(path: impl Into<String>, action: RouteAction) -> Self {
        Self {
            path: path.into(),
            action,
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Endpoints this provider needs in addition to the protected routes.
    fn routes(&self) -> Vec<AuthRoute>;

    /// Gate for protected routes.
    ///
    /// Returns the session identity without contacting the provider when one
    /// is present. Every other path ends in a terminal outcome.
    async fn authenticate(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome>;

    async fn begin_login(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        self.authenticate(ctx).await
    }

    async fn complete_login(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        self.authenticate(ctx).await
    }

    async fn logout(&self, ctx: &AuthContext<'_>, scope: LogoutScope) -> IdentityResult<Outcome>;
}
