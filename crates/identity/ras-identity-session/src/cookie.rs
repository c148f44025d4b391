//! Signed session cookie values.

use crate::SessionResult;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

/// Encodes session ids as HS256 JWTs signed with the application secret.
#[derive(Clone)]
pub struct SessionCookieCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl SessionCookieCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            ttl,
        }
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    pub fn encode(&self, sid: &str) -> SessionResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sid: sid.to_string(),
            iat: now.timestamp(),
            exp: self.expiry_from(now).timestamp(),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Session id carried by `value`. Fails on bad signatures and expiry.
    pub fn decode(&self, value: &str) -> SessionResult<String> {
        let token = decode::<SessionClaims>(
            value,
            &self.decoding_key,
            &Validation::new(self.algorithm),
        )?;
        Ok(token.claims.sid)
    }
}
