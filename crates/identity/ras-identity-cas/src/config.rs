//! CAS configuration.

use ras_identity_core::LogoutPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasConfig {
    /// Base URL of the CAS server; `login`, `validate` and `logout` are
    /// resolved against it.
    pub base_url: String,
    pub http_timeout: Duration,
    /// Skip TLS certificate verification when validating tickets.
    /// Only for development against CAS servers with private certificates.
    pub danger_accept_invalid_certs: bool,
    /// Where CAS sends the browser after its own logout. Defaults to the
    /// application's app-logout route on the request's origin.
    pub logout_return_url: Option<String>,
    pub provider_logout_path: String,
    pub app_logout_path: String,
    pub home_path: String,
    pub logout_policy: LogoutPolicy,
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fed.princeton.edu/cas/".to_string(),
            http_timeout: Duration::from_secs(2),
            danger_accept_invalid_certs: false,
            logout_return_url: None,
            provider_logout_path: "/api/logoutcas".to_string(),
            app_logout_path: "/api/logoutapp".to_string(),
            home_path: "/".to_string(),
            logout_policy: LogoutPolicy::default(),
        }
    }
}

impl CasConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_logout_return_url(mut self, url: impl Into<String>) -> Self {
        self.logout_return_url = Some(url.into());
        self
    }

    pub fn with_logout_policy(mut self, policy: LogoutPolicy) -> Self {
        self.logout_policy = policy;
        self
    }

    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }
}
