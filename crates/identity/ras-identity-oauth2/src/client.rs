//! OAuth2 client for the authorization-code flow.

use crate::config::OAuth2ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{ProviderMetadata, TokenResponse};
use ras_identity_core::Identity;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// OAuth2 client for handling authorization flows
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
}

impl OAuth2Client {
    pub fn new(http_timeout: Duration) -> OAuth2Result<Self> {
        let http_client = Client::builder().timeout(http_timeout).build()?;
        Ok(Self { http_client })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Authorization URL the browser is sent to.
    pub fn authorization_url(
        &self,
        metadata: &ProviderMetadata,
        provider_config: &OAuth2ProviderConfig,
        redirect_uri: &str,
    ) -> OAuth2Result<String> {
        let mut url = Url::parse(&metadata.authorization_endpoint)?;

        // Sorted so the URL is stable for a given configuration.
        let extra: BTreeMap<_, _> = provider_config.auth_params.iter().collect();

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &provider_config.client_id);
            params.append_pair("redirect_uri", redirect_uri);

            if !provider_config.scopes.is_empty() {
                params.append_pair("scope", &provider_config.scopes.join(" "));
            }

            for (key, value) in extra {
                params.append_pair(key, value);
            }
        }

        debug!(
            "Generated authorization URL for provider {}",
            provider_config.provider_id
        );
        Ok(url.to_string())
    }

    /// Exchange authorization code for tokens
    ///
    /// Client credentials go in the `Authorization: Basic` header.
    pub async fn exchange_code(
        &self,
        metadata: &ProviderMetadata,
        provider_config: &OAuth2ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(&metadata.token_endpoint)
            .basic_auth(
                form_encode(&provider_config.client_id),
                Some(form_encode(&provider_config.client_secret)),
            )
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed ({}): {}", status, error_text);
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        if !token_response.is_bearer() {
            return Err(OAuth2Error::InvalidTokenResponse(format!(
                "unsupported token type '{}'",
                token_response.token_type
            )));
        }

        info!("Successfully exchanged code for tokens");
        Ok(token_response)
    }

    /// Profile claims of the token's owner, as returned by the provider.
    pub async fn get_user_info(
        &self,
        metadata: &ProviderMetadata,
        access_token: &str,
    ) -> OAuth2Result<Identity> {
        let userinfo_endpoint = metadata.userinfo_endpoint.as_ref().ok_or_else(|| {
            OAuth2Error::ConfigError("Provider does not advertise a userinfo endpoint".to_string())
        })?;

        let response = self
            .http_client
            .get(userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("User info request failed ({}): {}", status, error_text);
            return Err(OAuth2Error::UserInfoFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let profile: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))?;

        Identity::from_value(profile).ok_or_else(|| {
            OAuth2Error::InvalidUserInfoResponse("profile is not a JSON object".to_string())
        })
    }
}

/// Client credentials are form-urlencoded before Basic encoding (RFC 6749 2.3.1).
fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            issuer: None,
            authorization_endpoint: "https://example.com/auth".to_string(),
            token_endpoint: "https://example.com/token".to_string(),
            userinfo_endpoint: Some("https://example.com/userinfo".to_string()),
            end_session_endpoint: None,
            jwks_uri: None,
            scopes_supported: None,
            response_types_supported: None,
        }
    }

    #[test]
    fn test_authorization_url_generation() {
        let client = OAuth2Client::new(Duration::from_secs(2)).unwrap();
        let mut provider_config = OAuth2ProviderConfig::google("test_client_id", "test_secret");
        provider_config
            .auth_params
            .insert("prompt".to_string(), "select_account".to_string());

        let auth_url = client
            .authorization_url(
                &metadata(),
                &provider_config,
                "http://localhost:8000/login/callback",
            )
            .unwrap();

        let url = Url::parse(&auth_url).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/auth");

        let params: HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("response_type"), Some(&"code".into()));
        assert_eq!(params.get("client_id"), Some(&"test_client_id".into()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"http://localhost:8000/login/callback".into())
        );
        assert_eq!(params.get("scope"), Some(&"openid email profile".into()));
        assert_eq!(params.get("prompt"), Some(&"select_account".into()));
        assert!(!params.contains_key("client_secret"));
    }
}
