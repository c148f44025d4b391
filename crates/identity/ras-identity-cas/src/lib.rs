//! CAS (Central Authentication Service) authenticator.
//!
//! Browsers without a session are sent to the CAS login page with the
//! current URL as `service`. CAS sends them back with a one-time `ticket`
//! parameter, which is validated server-to-server through the JSON flavour of
//! the `validate` endpoint before the identity is stored in the session.

mod authenticator;
mod client;
mod config;
mod error;
mod service_url;


pub use authenticator::TicketAuthenticator;
pub use client::{CasClient, CasValidation};
pub use config::CasConfig;
pub use error::{CasError, CasResult};
pub use service_url::{MISSING_SERVICE_URL, strip_ticket};

pub use ras_identity_core::{Authenticator, Identity, Outcome};
