//! Campus SSO demo server
//!
//! Run with `--production` to serve compiled bundles from `build/` and to
//! enforce production-only configuration checks.

use anyhow::{Context, Result};
use campus_sso_server::{AppState, Config, build_router, logging};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "campus-sso-server", about = "Campus single sign-on demo server")]
struct Cli {
    /// Run in production mode (serve built assets, strict config checks)
    #[arg(long)]
    production: bool,

    /// Configuration file (defaults to campus-sso.toml or CAMPUS_SSO_CONFIG_FILE)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables before reading configuration
    let _ = dotenvy::dotenv();

    let mut config = Config::load(cli.config.as_deref())?;
    config.server.production |= cli.production;

    logging::init_tracing(&config)?;
    config.validate().context("Invalid configuration")?;

    if !config.server.production {
        warn!("Running in development mode; pages load scripts from the front-end dev server");
    }

    let state = AppState::from_config(&config)?;
    let _cleanup = state.sessions.spawn_cleanup(config.session_cleanup_period());
    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Campus SSO server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
