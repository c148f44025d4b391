//! Identity records and authentication outcomes.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims asserted by an identity provider, kept exactly as received.
///
/// The record is only ever built from a response the provider validator
/// classified as a success, so holding one in the session is what "being
/// authenticated" means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Map<String, Value>);

impl Identity {
    /// Builds an identity from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(claims) => Some(Self(claims)),
            _ => None,
        }
    }

    fn claim(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of `field`, used to show who is logged in.
    pub fn display_name(&self, field: &str) -> Option<&str> {
        self.claim(field).and_then(Value::as_str)
    }

    /// Whether `name` holds a truthy claim: `true`, the string `"true"`
    /// (any case) or a non-zero number.
    pub fn claim_is_truthy(&self, name: &str) -> bool {
        match self.claim(name) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Result of an authentication step.
///
/// Anything other than [`Outcome::Identity`] ends the request: the caller
/// must hand the redirect or denial back to the client and stop.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "redirects and denials must be returned to the client"]
pub enum Outcome {
    /// The session holds a verified identity.
    Identity(Identity),
    /// Send the browser elsewhere (provider login, clean URL, landing page).
    RedirectTo(String),
    /// Surface the failure directly to the user.
    Denied { status: StatusCode, message: String },
}

impl Outcome {
    pub fn redirect(url: impl Into<String>) -> Self {
        Outcome::RedirectTo(url.into())
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Outcome::Identity(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Outcome::RedirectTo(url) => Some(url),
            _ => None,
        }
    }
}
