//! Application state, router and request handlers.

use crate::assets::AssetManifest;
use crate::config::{Config, ProviderKind};
use crate::error::AppError;
use crate::pages::{LogoutLink, Page, ScriptSource};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ras_identity_cas::{CasConfig, TicketAuthenticator};
use ras_identity_core::{
    AuthContext, Authenticator, Identity, LogoutScope, Outcome, RouteAction,
};
use ras_identity_oauth2::{CodeAuthenticator, OAuth2Config, OAuth2ProviderConfig};
use ras_identity_session::{
    ClientSession, CookieUpdate, InMemorySessionStore, SessionConfig, SessionManager,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing::{debug, info};

pub const PROTECTED_PATH: &str = "/protected";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn Authenticator>,
    pub sessions: SessionManager,
    pub assets: AssetManifest,
    pub public_url: Option<String>,
    pub dev_server_url: String,
    pub production: bool,
    pub display_field: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let authenticator = build_authenticator(config)?;

        let session_config = SessionConfig {
            secret: config.auth.secret_key.clone(),
            ttl: chrono::Duration::seconds(config.auth.session_ttl_seconds),
            cookie_name: config.auth.cookie_name.clone(),
            secure_cookie: config.auth.secure_cookie,
        };
        let sessions = SessionManager::new(session_config, Arc::new(InMemorySessionStore::new()))
            .context("Failed to create session manager")?;

        Ok(Self {
            authenticator,
            sessions,
            assets: AssetManifest::new(&config.assets.build_dir),
            public_url: config.server.public_url.clone(),
            dev_server_url: config.assets.dev_server_url.clone(),
            production: config.server.production,
            display_field: config.display_field().to_string(),
        })
    }

    fn bind_session(&self, jar: &CookieJar) -> ClientSession {
        let cookie_name = &self.sessions.config().cookie_name;
        self.sessions
            .bind(jar.get(cookie_name).map(|cookie| cookie.value()))
    }

    /// Absolute URL of the request as the browser sees it.
    fn current_url(&self, headers: &HeaderMap, uri: &Uri) -> Option<String> {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        if let Some(base) = &self.public_url {
            return Some(format!("{}{}", base.trim_end_matches('/'), path_and_query));
        }

        let host = headers.get(header::HOST)?.to_str().ok()?;
        Some(format!("http://{}{}", host, path_and_query))
    }

    /// Attaches whatever the session did during the request to the response.
    fn finish(
        &self,
        jar: CookieJar,
        session: &ClientSession,
        response: Response,
    ) -> Result<Response, AppError> {
        let config = self.sessions.config();

        let jar = match session.cookie_update()? {
            CookieUpdate::Set(value) => jar.add(
                Cookie::build((config.cookie_name.clone(), value))
                    .http_only(true)
                    .secure(config.secure_cookie)
                    .same_site(SameSite::Lax)
                    .path("/"),
            ),
            CookieUpdate::Remove => {
                jar.remove(Cookie::build((config.cookie_name.clone(), "")).path("/"))
            }
            CookieUpdate::Unchanged => jar,
        };

        Ok((jar, response).into_response())
    }

    async fn page(&self, app_name: &'static str, title: &'static str) -> Page {
        let script = if self.production {
            ScriptSource::Bundle(self.assets.asset_path(app_name).await)
        } else {
            ScriptSource::DevServer(self.dev_server_url.clone())
        };

        Page {
            app_name,
            title,
            script,
            user: None,
            logout_links: Vec::new(),
        }
    }

    fn logout_links(&self) -> Vec<LogoutLink> {
        self.authenticator
            .routes()
            .into_iter()
            .filter_map(|route| match route.action {
                RouteAction::Logout(LogoutScope::Provider) => Some(LogoutLink {
                    href: route.path,
                    label: "Logout".to_string(),
                }),
                RouteAction::Logout(LogoutScope::App) => Some(LogoutLink {
                    href: route.path,
                    label: "Logout of this app only".to_string(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Builds the authenticator selected by `auth.provider`.
pub fn build_authenticator(config: &Config) -> Result<Arc<dyn Authenticator>> {
    match config.auth.provider {
        ProviderKind::Cas => {
            let settings = &config.cas;
            let mut cas_config = CasConfig::new(&settings.base_url)
                .with_http_timeout(Duration::from_millis(settings.http_timeout_ms))
                .with_logout_policy(config.auth.logout_policy)
                .danger_accept_invalid_certs(settings.danger_accept_invalid_certs);
            if let Some(return_url) = &settings.logout_return_url {
                cas_config = cas_config.with_logout_return_url(return_url);
            }

            let authenticator =
                TicketAuthenticator::new(cas_config).context("Failed to create CAS authenticator")?;
            info!("Using CAS authentication at {}", settings.base_url);
            Ok(Arc::new(authenticator))
        }
        ProviderKind::Google => {
            let settings = &config.google;
            let mut provider =
                OAuth2ProviderConfig::google(&settings.client_id, &settings.client_secret);
            provider.discovery_url = settings.discovery_url.clone();
            provider.redirect_uri = settings.redirect_uri.clone();
            provider.provider_logout_url = settings.provider_logout_url.clone();

            let mut oauth2_config = OAuth2Config::new(provider)
                .with_logout_policy(config.auth.logout_policy)
                .with_http_timeout(Duration::from_millis(settings.http_timeout_ms));
            if let Some(seconds) = settings.discovery_cache_seconds {
                oauth2_config = oauth2_config.with_discovery_cache(Duration::from_secs(seconds));
            }

            let authenticator = CodeAuthenticator::new(oauth2_config)
                .context("Failed to create OpenID Connect authenticator")?;
            info!("Using OpenID Connect authentication via {}", settings.discovery_url);
            Ok(Arc::new(authenticator))
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(landing_handler))
        .route(PROTECTED_PATH, get(protected_handler))
        .route("/health", get(|| async { "OK" }));

    for route in state.authenticator.routes() {
        let action = route.action;
        debug!("Registering {} for {:?}", route.path, action);
        router = router.route(
            &route.path,
            get(
                move |state: State<AppState>,
                      jar: CookieJar,
                      headers: HeaderMap,
                      uri: Uri,
                      query: Query<HashMap<String, String>>| {
                    provider_route_handler(action, state, jar, headers, uri, query)
                },
            ),
        );
    }

    let build_dir = state.assets.build_dir().to_path_buf();
    router
        .nest_service("/build", ServeDir::new(build_dir))
        .with_state(state)
}

/// Maps a terminal outcome onto an HTTP response.
fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::RedirectTo(url) => Redirect::to(&url).into_response(),
        Outcome::Denied { status, message } => (status, message).into_response(),
        Outcome::Identity(_) => Redirect::to(PROTECTED_PATH).into_response(),
    }
}

async fn landing_handler(State(state): State<AppState>) -> Response {
    state
        .page("landing", "Campus SSO")
        .await
        .render()
        .into_response()
}

async fn protected_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let session = state.bind_session(&jar);
    let ctx = AuthContext::new(state.current_url(&headers, &uri), query, &session);

    let response = match state.authenticator.authenticate(&ctx).await? {
        Outcome::Identity(identity) => protected_page(&state, &identity).await,
        outcome => outcome_response(outcome),
    };

    state.finish(jar, &session, response)
}

async fn protected_page(state: &AppState, identity: &Identity) -> Response {
    let mut page = state.page("protected", "Protected Area").await;
    page.user = identity
        .display_name(&state.display_field)
        .map(str::to_string);
    page.logout_links = state.logout_links();
    page.render().into_response()
}

async fn provider_route_handler(
    action: RouteAction,
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let session = state.bind_session(&jar);
    let ctx = AuthContext::new(state.current_url(&headers, &uri), query, &session);
    let authenticator = &state.authenticator;

    let outcome = match action {
        RouteAction::BeginLogin => authenticator.begin_login(&ctx).await?,
        RouteAction::CompleteLogin => authenticator.complete_login(&ctx).await?,
        RouteAction::Logout(scope) => authenticator.logout(&ctx, scope).await?,
    };

    state.finish(jar, &session, outcome_response(outcome))
}
