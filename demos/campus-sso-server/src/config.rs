//! Configuration for the campus SSO server
//!
//! Values are layered, later sources winning:
//! - Defaults
//! - Configuration file (campus-sso.toml, or `CAMPUS_SSO_CONFIG_FILE`)
//! - Environment variables with the `CAMPUS_SSO` prefix (`CAMPUS_SSO__SERVER__PORT`)
//! - Direct variables such as `APP_SECRET_KEY` and `GOOGLE_CLIENT_ID`
//!
//! Secrets have no defaults; [`Config::validate`] refuses to start without them.

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use ras_identity_core::LogoutPolicy;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "campus-sso.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cas: CasSettings,
    pub google: GoogleSettings,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    pub host: IpAddr,

    /// Port to bind to (default: 8000)
    pub port: u16,

    /// Externally visible base URL, e.g. `https://sso.example.edu`.
    /// When unset, request URLs are rebuilt from the `Host` header.
    pub public_url: Option<String>,

    /// Production mode. Also switched on by the `--production` flag.
    pub production: bool,
}

/// Which identity provider guards `/protected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Cas,
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub provider: ProviderKind,

    /// Signs session cookies. Read from `APP_SECRET_KEY`.
    pub secret_key: String,

    /// Session lifetime in seconds (default: 86400 = 24 hours)
    pub session_ttl_seconds: i64,

    /// How often expired sessions are swept from the store (default: 300)
    pub session_cleanup_seconds: u64,

    pub cookie_name: String,

    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,

    pub logout_policy: LogoutPolicy,

    /// Identity claim shown as the user's name. Defaults to `user` for CAS
    /// and `email` for Google.
    pub display_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CasSettings {
    pub base_url: String,
    pub http_timeout_ms: u64,
    pub danger_accept_invalid_certs: bool,
    pub logout_return_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub discovery_url: String,
    pub redirect_uri: Option<String>,
    pub provider_logout_url: String,
    pub http_timeout_ms: u64,
    /// Keep the discovery document for this many seconds; fetched per flow when unset.
    pub discovery_cache_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the front-end build and its `.vite/manifest.json`
    pub build_dir: PathBuf,

    /// Front-end dev server used for pages outside production mode
    pub dev_server_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,

    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            public_url: None,
            production: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            secret_key: String::new(),
            session_ttl_seconds: 86400,
            session_cleanup_seconds: 300,
            cookie_name: "session".to_string(),
            secure_cookie: false,
            logout_policy: LogoutPolicy::default(),
            display_field: None,
        }
    }
}

impl Default for CasSettings {
    fn default() -> Self {
        Self {
            base_url: "https://fed.princeton.edu/cas/".to_string(),
            http_timeout_ms: 2000,
            danger_accept_invalid_certs: false,
            logout_return_url: None,
        }
    }
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            discovery_url: ras_identity_oauth2::GOOGLE_DISCOVERY_URL.to_string(),
            redirect_uri: None,
            provider_logout_url: ras_identity_oauth2::GOOGLE_LOGOUT_URL.to_string(),
            http_timeout_ms: 2000,
            discovery_cache_seconds: None,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            dev_server_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file and the environment.
    ///
    /// `config_file` takes precedence over `CAMPUS_SSO_CONFIG_FILE`. A missing
    /// default file is not an error; a missing explicit one is.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        match config_file {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path));
            }
            None => {
                let config_path = std::env::var("CAMPUS_SSO_CONFIG_FILE")
                    .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

                if Path::new(&config_path).exists() {
                    info!("Loading configuration from {}", config_path);
                    builder = builder.add_source(File::with_name(&config_path));
                } else {
                    debug!("No config file found at {}, using defaults", config_path);
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CAMPUS_SSO")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut settings: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.apply_env_overrides()?;

        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(secret) = std::env::var("APP_SECRET_KEY") {
            self.auth.secret_key = secret;
        }

        if let Ok(client_id) = std::env::var("GOOGLE_CLIENT_ID") {
            self.google.client_id = client_id;
        }

        if let Ok(client_secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = client_secret;
        }

        if let Ok(host) = std::env::var("HOST") {
            info!("Using HOST environment variable");
            self.server.host = host.parse().context("Invalid HOST value")?;
        }

        if let Ok(port) = std::env::var("PORT") {
            info!("Using PORT environment variable");
            self.server.port = port.parse().context("Invalid PORT value")?;
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.logging.level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if let Some(public_url) = &self.server.public_url {
            if !(public_url.starts_with("http://") || public_url.starts_with("https://")) {
                anyhow::bail!("server.public_url must be an absolute http(s) URL");
            }
        }

        if self.auth.secret_key.is_empty() {
            anyhow::bail!("APP_SECRET_KEY must be set");
        }

        if self.auth.session_ttl_seconds <= 0 {
            anyhow::bail!("Session TTL must be positive");
        }

        if self.auth.session_cleanup_seconds == 0 {
            anyhow::bail!("auth.session_cleanup_seconds must be greater than 0");
        }

        if self.auth.cookie_name.is_empty() {
            anyhow::bail!("Session cookie name cannot be empty");
        }

        match self.auth.provider {
            ProviderKind::Cas => {
                if self.cas.base_url.is_empty() {
                    anyhow::bail!("cas.base_url must be set");
                }
                if self.cas.http_timeout_ms == 0 {
                    anyhow::bail!("cas.http_timeout_ms must be greater than 0");
                }
                if self.server.production && self.cas.danger_accept_invalid_certs {
                    anyhow::bail!(
                        "cas.danger_accept_invalid_certs cannot be enabled in production mode"
                    );
                }
            }
            ProviderKind::Google => {
                if self.google.client_id.is_empty() {
                    anyhow::bail!("GOOGLE_CLIENT_ID must be set");
                }
                if self.google.client_secret.is_empty() {
                    anyhow::bail!("GOOGLE_CLIENT_SECRET must be set");
                }
                if self.google.http_timeout_ms == 0 {
                    anyhow::bail!("google.http_timeout_ms must be greater than 0");
                }
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !self.is_filter_directive() && !valid_levels.contains(&level_lower.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        let valid_formats = ["pretty", "json", "compact"];
        let format_lower = self.logging.format.to_lowercase();
        if !valid_formats.contains(&format_lower.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            );
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.server.host, self.server.port))
    }

    pub fn session_cleanup_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.auth.session_cleanup_seconds)
    }

    pub fn display_field(&self) -> &str {
        match (&self.auth.display_field, self.auth.provider) {
            (Some(field), _) => field,
            (None, ProviderKind::Cas) => "user",
            (None, ProviderKind::Google) => "email",
        }
    }

    fn is_filter_directive(&self) -> bool {
        self.logging.level.contains('=') || self.logging.level.contains(',')
    }

    /// Get the log filter string for tracing
    pub fn log_filter(&self) -> String {
        if self.is_filter_directive() {
            self.logging.level.clone()
        } else {
            format!(
                "campus_sso_server={level},ras_identity_cas={level},ras_identity_oauth2={level},ras_identity_session={level},{level}",
                level = self.logging.level
            )
        }
    }
}
