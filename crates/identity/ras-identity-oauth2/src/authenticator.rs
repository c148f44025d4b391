//! Authorization-code authenticator.

use crate::client::OAuth2Client;
use crate::config::OAuth2Config;
use crate::discovery::DiscoveryClient;
use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use http::StatusCode;
use ras_identity_core::{
    AuthContext, AuthRoute, Authenticator, IdentityResult, LogoutPolicy, LogoutScope, Outcome,
    RouteAction,
};
use std::sync::Arc;
use tracing::{info, warn};

pub const UNVERIFIED_MESSAGE: &str =
    "User email not available or not verified by the identity provider.";

/// Authenticates requests through an OpenID Connect provider.
#[derive(Clone)]
pub struct CodeAuthenticator {
    config: OAuth2Config,
    client: OAuth2Client,
    discovery: Arc<DiscoveryClient>,
}

impl CodeAuthenticator {
    pub fn new(config: OAuth2Config) -> OAuth2Result<Self> {
        config.validate().map_err(OAuth2Error::ConfigError)?;

        let client = OAuth2Client::new(config.http_timeout)?;
        let discovery = Arc::new(DiscoveryClient::new(
            client.http_client().clone(),
            config.discovery_cache_ttl,
        ));

        Ok(Self {
            config,
            client,
            discovery,
        })
    }

    /// Must be identical on the authorization and the token request.
    fn redirect_uri(&self, ctx: &AuthContext<'_>) -> OAuth2Result<String> {
        if let Some(uri) = &self.config.provider.redirect_uri {
            return Ok(uri.clone());
        }

        let origin = ctx.origin().ok_or_else(|| {
            OAuth2Error::ConfigError(
                "cannot derive redirect_uri without an absolute request URL".to_string(),
            )
        })?;
        Ok(format!("{}{}", origin, self.config.routes.callback_path()))
    }
}

#[async_trait]
impl Authenticator for CodeAuthenticator {
    fn provider_id(&self) -> &str {
        &self.config.provider.provider_id
    }

    fn routes(&self) -> Vec<AuthRoute> {
        let routes = &self.config.routes;
        vec![
            AuthRoute::new(routes.login_path.clone(), RouteAction::BeginLogin),
            AuthRoute::new(routes.callback_path(), RouteAction::CompleteLogin),
            AuthRoute::new(
                routes.provider_logout_path.clone(),
                RouteAction::Logout(LogoutScope::Provider),
            ),
            AuthRoute::new(
                routes.app_logout_path.clone(),
                RouteAction::Logout(LogoutScope::App),
            ),
        ]
    }

    async fn authenticate(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        if let Some(identity) = ctx.session().load().await? {
            return Ok(Outcome::Identity(identity));
        }

        self.begin_login(ctx).await
    }

    async fn begin_login(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        let provider = &self.config.provider;
        let metadata = self.discovery.fetch(&provider.discovery_url).await?;
        let redirect_uri = self.redirect_uri(ctx)?;

        let url = self
            .client
            .authorization_url(&metadata, provider, &redirect_uri)?;

        info!("Started OAuth2 flow for provider: {}", provider.provider_id);
        Ok(Outcome::redirect(url))
    }

    async fn complete_login(&self, ctx: &AuthContext<'_>) -> IdentityResult<Outcome> {
        if let Some(error) = ctx.query_param("error") {
            let description = ctx
                .query_param("error_description")
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!("{}: {}", error, description)).into());
        }

        let Some(code) = ctx.query_param("code") else {
            warn!("OAuth2 callback without authorization code, restarting flow");
            return self.begin_login(ctx).await;
        };

        let provider = &self.config.provider;
        let metadata = self.discovery.fetch(&provider.discovery_url).await?;
        let redirect_uri = self.redirect_uri(ctx)?;

        let token_response = self
            .client
            .exchange_code(&metadata, provider, code, &redirect_uri)
            .await?;

        let profile = self
            .client
            .get_user_info(&metadata, &token_response.access_token)
            .await?;

        if !profile.claim_is_truthy(&provider.verified_claim) {
            warn!(
                "Rejecting profile from {}: claim '{}' is not set",
                provider.provider_id, provider.verified_claim
            );
            return Ok(Outcome::Denied {
                status: StatusCode::BAD_REQUEST,
                message: UNVERIFIED_MESSAGE.to_string(),
            });
        }

        info!(
            "Successfully verified identity for provider: {}",
            provider.provider_id
        );
        ctx.session().store(profile).await?;
        Ok(Outcome::redirect(self.config.routes.post_login_path.clone()))
    }

    async fn logout(&self, ctx: &AuthContext<'_>, scope: LogoutScope) -> IdentityResult<Outcome> {
        ctx.session().clear().await?;

        if scope == LogoutScope::App || self.config.logout_policy == LogoutPolicy::AppOnly {
            info!("Cleared application session");
            return Ok(Outcome::redirect(self.config.routes.home_path.clone()));
        }

        info!(
            "Cleared application session, ending {} session",
            self.config.provider.provider_id
        );
        Ok(Outcome::redirect(
            self.config.provider.provider_logout_url.clone(),
        ))
    }
}
