//! OAuth2 configuration types.

use ras_identity_core::LogoutPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const GOOGLE_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
pub const GOOGLE_LOGOUT_URL: &str = "https://mail.google.com/mail/u/0/?logout&hl=en";

/// OAuth2 provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ProviderConfig {
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub discovery_url: String,
    pub scopes: Vec<String>,
    /// Additional parameters to include in authorization request
    pub auth_params: HashMap<String, String>,
    /// Fixed redirect URI. When unset it is derived from the request origin
    /// and the callback path.
    pub redirect_uri: Option<String>,
    /// Claim that must be truthy before a profile is accepted.
    pub verified_claim: String,
    /// Where the provider sends the browser to end its own session.
    pub provider_logout_url: String,
}

impl OAuth2ProviderConfig {
    /// Google with the `openid email profile` scopes.
    pub fn google(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            provider_id: "google".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            discovery_url: GOOGLE_DISCOVERY_URL.to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            auth_params: HashMap::new(),
            redirect_uri: None,
            verified_claim: "email_verified".to_string(),
            provider_logout_url: GOOGLE_LOGOUT_URL.to_string(),
        }
    }
}

/// Application routes the authenticator mounts or redirects to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Routes {
    pub login_path: String,
    pub provider_logout_path: String,
    pub app_logout_path: String,
    pub post_login_path: String,
    pub home_path: String,
}

impl Default for OAuth2Routes {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            provider_logout_path: "/logoutgoogle".to_string(),
            app_logout_path: "/logoutapp".to_string(),
            post_login_path: "/protected".to_string(),
            home_path: "/".to_string(),
        }
    }
}

impl OAuth2Routes {
    /// The provider returns to the login route's `/callback` child.
    pub fn callback_path(&self) -> String {
        format!("{}/callback", self.login_path.trim_end_matches('/'))
    }
}

/// OAuth2 client configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub provider: OAuth2ProviderConfig,
    pub routes: OAuth2Routes,
    pub logout_policy: LogoutPolicy,
    pub http_timeout: Duration,
    /// Keep discovery documents this long. `None` fetches on every flow.
    pub discovery_cache_ttl: Option<Duration>,
}

impl OAuth2Config {
    pub fn new(provider: OAuth2ProviderConfig) -> Self {
        Self {
            provider,
            routes: OAuth2Routes::default(),
            logout_policy: LogoutPolicy::default(),
            http_timeout: Duration::from_secs(2),
            discovery_cache_ttl: None,
        }
    }

    pub fn with_routes(mut self, routes: OAuth2Routes) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_logout_policy(mut self, policy: LogoutPolicy) -> Self {
        self.logout_policy = policy;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_discovery_cache(mut self, ttl: Duration) -> Self {
        self.discovery_cache_ttl = Some(ttl);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.provider.client_id.is_empty() {
            return Err("client_id must not be empty".to_string());
        }
        if self.provider.client_secret.is_empty() {
            return Err("client_secret must not be empty".to_string());
        }
        if self.provider.discovery_url.is_empty() {
            return Err("discovery_url must not be empty".to_string());
        }
        Ok(())
    }
}
