//! Integration tests for the campus SSO server
//!
//! These drive the full router with `tower::ServiceExt::oneshot` while a
//! wiremock server stands in for the CAS server or the OpenID provider.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use campus_sso_server::config::ProviderKind;
use campus_sso_server::{AppState, Config, build_router};
use ras_identity_oauth2::UNVERIFIED_MESSAGE;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "app.example";

fn base_config(build_dir: &Path) -> Config {
    let mut config = Config::default();
    config.auth.secret_key = "integration-secret".to_string();
    config.assets.build_dir = build_dir.to_path_buf();
    config.server.production = true;
    config
}

fn cas_app(mock_server: &MockServer, build_dir: &Path) -> Router {
    let mut config = base_config(build_dir);
    config.cas.base_url = format!("{}/cas/", mock_server.uri());
    config.validate().unwrap();
    build_router(AppState::from_config(&config).unwrap())
}

fn google_app(mock_server: &MockServer, build_dir: &Path) -> Router {
    let mut config = base_config(build_dir);
    config.auth.provider = ProviderKind::Google;
    config.google.client_id = "mock_client_id".to_string();
    config.google.client_secret = "mock_secret".to_string();
    config.google.discovery_url =
        format!("{}/.well-known/openid-configuration", mock_server.uri());
    config.validate().unwrap();
    build_router(AppState::from_config(&config).unwrap())
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri).header(header::HOST, HOST);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

fn location_params(response: &Response<Body>) -> (String, HashMap<String, String>) {
    let url = Url::parse(&location(response)).unwrap();
    let params = url.query_pairs().into_owned().collect();
    (url.path().to_string(), params)
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

/// `name=value` pair to send back in a `Cookie` header.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

async fn mount_cas_success(mock_server: &MockServer, ticket: &str) {
    Mock::given(method("GET"))
        .and(path("/cas/validate"))
        .and(query_param("service", "http://app.example/protected"))
        .and(query_param("ticket", ticket))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serviceResponse": {
                "authenticationSuccess": {
                    "user": "jdoe",
                    "attributes": {"displayname": "Jane Doe"}
                }
            }
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

/// Runs the CAS ticket round-trip and returns the session cookie pair.
async fn cas_login(app: &Router, mock_server: &MockServer) -> String {
    mount_cas_success(mock_server, "ST-1").await;

    let response = get(app, "/protected?ticket=ST-1", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://app.example/protected");

    cookie_pair(&set_cookie(&response).expect("session cookie issued"))
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_landing_page_uses_manifest() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(build_dir.path().join(".vite")).unwrap();
    std::fs::write(
        build_dir.path().join(".vite/manifest.json"),
        json!({"src/landing/main.jsx": {"file": "assets/landing-4f2a9c.js"}}).to_string(),
    )
    .unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("/build/assets/landing-4f2a9c.js"));
}

#[tokio::test]
async fn test_build_passthrough() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(build_dir.path().join("assets")).unwrap();
    std::fs::write(
        build_dir.path().join("assets/landing.js"),
        "console.log('landing');",
    )
    .unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/build/assets/landing.js", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "console.log('landing');");

    let response = get(&app, "/build/assets/missing.js", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_redirects_to_cas_login() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/protected", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (login_path, params) = location_params(&response);
    assert_eq!(login_path, "/cas/login");
    assert_eq!(params["service"], "http://app.example/protected");
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_ticket_login_and_session_reuse() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    mount_cas_success(&mock_server, "ST-1").await;

    let response = get(&app, "/protected?ticket=ST-1", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://app.example/protected");

    let issued = set_cookie(&response).expect("session cookie issued");
    assert!(issued.starts_with("session="));
    assert!(issued.contains("HttpOnly"));
    assert!(issued.contains("SameSite=Lax"));
    assert!(issued.contains("Path=/"));
    assert!(!issued.contains("Secure"));

    // Validation is mocked with expect(1): the repeat visit must not call CAS.
    let response = get(&app, "/protected", Some(&cookie_pair(&issued))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Signed in as <strong>jdoe</strong>"));
    assert!(html.contains(r#"href="/api/logoutcas""#));
}

#[tokio::test]
async fn test_rejected_ticket_redirects_with_clean_service() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cas/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serviceResponse": {
                "authenticationFailure": {"code": "INVALID_TICKET", "description": "expired"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/protected?ticket=ST-BAD", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (login_path, params) = location_params(&response);
    assert_eq!(login_path, "/cas/login");
    assert_eq!(params["service"], "http://app.example/protected");
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());

    let response = get(&app, "/protected", Some("session=not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (login_path, _) = location_params(&response);
    assert_eq!(login_path, "/cas/login");
}

#[tokio::test]
async fn test_app_logout_clears_session() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());
    let cookie = cas_login(&app, &mock_server).await;

    let response = get(&app, "/api/logoutapp", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let removal = set_cookie(&response).expect("removal cookie");
    assert!(removal.starts_with("session="));
    assert!(removal.contains("Max-Age=0"));

    // The old cookie no longer names a live session.
    let response = get(&app, "/protected", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (login_path, _) = location_params(&response);
    assert_eq!(login_path, "/cas/login");

    // Logging out again is harmless.
    let response = get(&app, "/api/logoutapp", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_cas_logout_ends_provider_session() {
    let mock_server = MockServer::start().await;
    let build_dir = TempDir::new().unwrap();
    let app = cas_app(&mock_server, build_dir.path());
    let cookie = cas_login(&app, &mock_server).await;

    let response = get(&app, "/api/logoutcas", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (logout_path, params) = location_params(&response);
    assert_eq!(logout_path, "/cas/logout");
    assert_eq!(params["service"], "http://app.example/api/logoutapp");
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
}

async fn mount_oidc_provider(mock_server: &MockServer, profile: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": mock_server.uri(),
            "authorization_endpoint": format!("{}/authorize", mock_server.uri()),
            "token_endpoint": format!("{}/token", mock_server.uri()),
            "userinfo_endpoint": format!("{}/userinfo", mock_server.uri()),
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "mock_access_token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_google_login_redirects_to_provider() {
    let mock_server = MockServer::start().await;
    mount_oidc_provider(&mock_server, json!({})).await;
    let build_dir = TempDir::new().unwrap();
    let app = google_app(&mock_server, build_dir.path());

    let response = get(&app, "/protected", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (authorize_path, params) = location_params(&response);
    assert_eq!(authorize_path, "/authorize");
    assert_eq!(params["redirect_uri"], "http://app.example/login/callback");
    assert_eq!(params["client_id"], "mock_client_id");
}

#[tokio::test]
async fn test_google_callback_signs_in() {
    let mock_server = MockServer::start().await;
    mount_oidc_provider(
        &mock_server,
        json!({"sub": "42", "email": "jdoe@example.edu", "email_verified": true}),
    )
    .await;
    let build_dir = TempDir::new().unwrap();
    let app = google_app(&mock_server, build_dir.path());

    let response = get(&app, "/login/callback?code=mock_code", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/protected");
    let cookie = cookie_pair(&set_cookie(&response).expect("session cookie issued"));

    let response = get(&app, "/protected", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("jdoe@example.edu"));
    assert!(html.contains(r#"href="/logoutgoogle""#));
}

#[tokio::test]
async fn test_google_unverified_email_is_bad_request() {
    let mock_server = MockServer::start().await;
    mount_oidc_provider(
        &mock_server,
        json!({"sub": "42", "email": "jdoe@example.edu", "email_verified": false}),
    )
    .await;
    let build_dir = TempDir::new().unwrap();
    let app = google_app(&mock_server, build_dir.path());

    let response = get(&app, "/login/callback?code=mock_code", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&response).is_none());
    assert_eq!(body_text(response).await, UNVERIFIED_MESSAGE);
}

#[tokio::test]
async fn test_google_token_failure_is_unauthorized() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_endpoint": format!("{}/authorize", mock_server.uri()),
            "token_endpoint": format!("{}/token", mock_server.uri()),
            "userinfo_endpoint": format!("{}/userinfo", mock_server.uri()),
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&mock_server)
        .await;
    let build_dir = TempDir::new().unwrap();
    let app = google_app(&mock_server, build_dir.path());

    let response = get(&app, "/login/callback?code=stale", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Authentication failed");
}

#[tokio::test]
async fn test_google_discovery_outage_is_bad_gateway() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let build_dir = TempDir::new().unwrap();
    let app = google_app(&mock_server, build_dir.path());

    let response = get(&app, "/login", None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
