//! Campus single sign-on demo server.
//!
//! Serves a public landing page and a `/protected` page guarded by either a
//! CAS ticket authenticator or an OpenID Connect code authenticator, with
//! identities kept in a cookie-bound server-side session.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod pages;

pub use app::{AppState, PROTECTED_PATH, build_authenticator, build_router};
pub use config::Config;
