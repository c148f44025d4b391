//! CAS ticket authenticator.

use crate::client::{CasClient, CasValidation};
use crate::config::CasConfig;
use crate::error::CasResult;
use crate::service_url::strip_ticket;
use async_trait::async_trait;
use ras_identity_core::{
    AuthContext, AuthRoute, Authenticator, IdentityResult, LogoutPolicy, LogoutScope, Outcome,
    RouteAction,
};
use tracing::{error, info, warn};

/// Authenticates requests against a CAS server.
///
/// The first visit always ends in a redirect: to the CAS login page when no
/// ticket is present, back to login when the ticket is rejected, or to the
/// ticket-free URL once the identity is in the session. Only later visits
/// get the identity back directly.
#[derive(Clone)]
pub struct TicketAuthenticator {
    client: CasClient,
    config: CasConfig,
}

impl TicketAuthenticator {
    pub fn new(config: CasConfig) -> CasResult<Self> {
        let client = CasClient::new(&config)?;
        Ok(Self { client, config })
    }

    fn login_redirect(&self, service: &str) -> IdentityResult<Outcome> {
        Ok(Outcome::redirect(self.client.login_url(service)?))
    }

    fn logout_return_url(&self, ctx: &AuthContext<'_>) -> String {
        if let Some(url) = &self.config.logout_return_url {
            return url.clone();
        }

        match ctx.origin() {
            Some(origin) => format!("{}{}", origin, self.config.app_logout_path),
            None => {
                warn!("Cannot determine request origin for CAS logout return URL");
                self.config.app_logout_path.clone()
            }
        }
    }
}

#[async_trait]
impl Authenticator for TicketAuthenticator {
    fn provider_id(&self) -> &str {
        "cas"
    }

    fn routes(&self) -> Vec<AuthRoute> {
        vec![
            AuthRoute::new(
                self.config.provider_logout_path.clone(),
                RouteAction::Logout(LogoutScope::Provider),
            ),
            AuthRoute::new(
                self.config.app_logout_path.clone(),
                RouteAction::Logout(LogoutScope::App),
            ),
        ]
    }

    async fn authenticate(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        if let Some(identity) = ctx.session().load().await? {
            return Ok(Outcome::Identity(identity));
        }

        let Some(ticket) = ctx.query_param("ticket") else {
            let service = ctx
                .current_url()
                .map(str::to_string)
                .unwrap_or_else(|| strip_ticket(None));
            return self.login_redirect(&service);
        };

        // The ticket was issued for the URL without it.
        let service = strip_ticket(ctx.current_url());

        match self.client.validate(&service, ticket).await {
            Ok(CasValidation::Success(identity)) => {
                info!(
                    "CAS authentication succeeded for {}",
                    identity.display_name("user").unwrap_or("<unnamed>")
                );
                ctx.session().store(identity).await?;
                Ok(Outcome::redirect(service))
            }
            Ok(CasValidation::Failure(detail)) => {
                warn!("CAS authentication failure: {}", detail);
                self.login_redirect(&service)
            }
            Ok(CasValidation::Malformed(detail)) => {
                warn!("Unexpected CAS response: {}", detail);
                self.login_redirect(&service)
            }
            Err(e) => {
                error!("CAS ticket validation failed: {}", e);
                self.login_redirect(&service)
            }
        }
    }

    async fn logout(&self, ctx: &AuthContext<'_>, scope: LogoutScope) -> IdentityResult<Outcome> {
        ctx.session().clear().await?;

        if scope == LogoutScope::App || self.config.logout_policy == LogoutPolicy::AppOnly {
            info!("Cleared application session");
            return Ok(Outcome::redirect(self.config.home_path.clone()));
        }

        let return_url = self.logout_return_url(ctx);
        info!("Cleared application session, ending CAS session");
        Ok(Outcome::redirect(self.client.logout_url(&return_url)?))
    }
}
