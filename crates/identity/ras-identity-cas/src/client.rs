//! CAS server client: login/logout URLs and ticket validation.

use crate::config::CasConfig;
use crate::error::{CasError, CasResult};
use ras_identity_core::Identity;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Classification of a CAS `validate?format=json` response body.
#[derive(Debug, Clone, PartialEq)]
pub enum CasValidation {
    /// `serviceResponse.authenticationSuccess`, kept as received.
    Success(Identity),
    /// `serviceResponse.authenticationFailure`.
    Failure(Value),
    /// Anything else. Never treated as a success.
    Malformed(String),
}

impl CasValidation {
    pub fn classify(body: &Value) -> Self {
        let Some(service_response) = body.get("serviceResponse") else {
            return CasValidation::Malformed("missing serviceResponse".to_string());
        };

        if let Some(success) = service_response.get("authenticationSuccess") {
            return match Identity::from_value(success.clone()) {
                Some(identity) => CasValidation::Success(identity),
                None => CasValidation::Malformed(
                    "authenticationSuccess is not an object".to_string(),
                ),
            };
        }

        if let Some(failure) = service_response.get("authenticationFailure") {
            return CasValidation::Failure(failure.clone());
        }

        CasValidation::Malformed(service_response.to_string())
    }
}

#[derive(Clone)]
pub struct CasClient {
    http_client: Client,
    base_url: Url,
}

impl CasClient {
    pub fn new(config: &CasConfig) -> CasResult<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CasError::ConfigError(format!(
                "CAS base URL must be http(s): {}",
                config.base_url
            )));
        }

        if config.danger_accept_invalid_certs {
            warn!(
                "TLS certificate verification is disabled for CAS server {}",
                base_url
            );
        }

        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn login_url(&self, service: &str) -> CasResult<String> {
        self.endpoint_url("login", &[("service", service)])
    }

    pub fn logout_url(&self, service: &str) -> CasResult<String> {
        self.endpoint_url("logout", &[("service", service)])
    }

    pub fn validation_url(&self, service: &str, ticket: &str) -> CasResult<String> {
        self.endpoint_url(
            "validate",
            &[("service", service), ("ticket", ticket), ("format", "json")],
        )
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> CasResult<String> {
        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url.to_string())
    }

    /// Asks the CAS server whether `ticket` was issued for `service`.
    ///
    /// `service` must be the ticket-free URL the ticket was requested for.
    pub async fn validate(&self, service: &str, ticket: &str) -> CasResult<CasValidation> {
        let validation_url = self.validation_url(service, ticket)?;
        debug!("Validating CAS ticket for service {}", service);

        let response = self.http_client.get(&validation_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(CasValidation::Malformed(format!("HTTP {}", status)));
        }
        let bytes = response.bytes().await?;

        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| CasError::InvalidResponse {
                status: status.as_u16(),
                reason: e.to_string(),
            })?;

        Ok(CasValidation::classify(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn client() -> CasClient {
        CasClient::new(&CasConfig::new("https://cas.example/cas")).unwrap()
    }

    #[test]
    fn test_classify_success() {
        let body = json!({"serviceResponse": {"authenticationSuccess": {"user": "alice"}}});
        let CasValidation::Success(identity) = CasValidation::classify(&body) else {
            panic!("expected success");
        };
        assert_eq!(identity.display_name("user"), Some("alice"));
    }

    #[test]
    fn test_classify_failure() {
        let body = json!({"serviceResponse": {"authenticationFailure": {"code": "INVALID_TICKET"}}});
        assert_eq!(
            CasValidation::classify(&body),
            CasValidation::Failure(json!({"code": "INVALID_TICKET"}))
        );
    }

    #[test]
    fn test_classify_never_succeeds_on_unexpected_shapes() {
        for body in [
            json!(null),
            json!({}),
            json!([]),
            json!({"serviceResponse": {}}),
            json!({"serviceResponse": {"somethingElse": true}}),
            json!({"authenticationSuccess": {"user": "alice"}}),
            json!({"serviceResponse": {"authenticationSuccess": "alice"}}),
        ] {
            assert!(
                matches!(CasValidation::classify(&body), CasValidation::Malformed(_)),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client();

        let login = Url::parse(&client.login_url("https://app.example/protected?a=1").unwrap())
            .unwrap();
        assert_eq!(login.path(), "/cas/login");
        let params: HashMap<_, _> = login.query_pairs().collect();
        assert_eq!(
            params.get("service"),
            Some(&"https://app.example/protected?a=1".into())
        );

        let validate = Url::parse(
            &client
                .validation_url("https://app.example/protected", "ST-1&x")
                .unwrap(),
        )
        .unwrap();
        assert_eq!(validate.path(), "/cas/validate");
        let params: HashMap<_, _> = validate.query_pairs().collect();
        assert_eq!(params.get("ticket"), Some(&"ST-1&x".into()));
        assert_eq!(params.get("format"), Some(&"json".into()));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_non_http_base_is_rejected() {
        let result = CasClient::new(&CasConfig::new("ftp://cas.example/"));
        assert!(matches!(result, Err(CasError::ConfigError(_))));
    }
}
