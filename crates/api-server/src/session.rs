//! Session identity
//!
//! Accounts live in an external system. Its sessions reach us as HS256 JWTs
//! with the numeric user id in `sub`, sent as a bearer token or in the
//! `mg_session` cookie. Anything that does not verify is anonymous.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
#[cfg(test)]
use chrono::{Duration, Utc};
#[cfg(test)]
use jsonwebtoken::{encode, EncodingKey, Header};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "mg_session";
const DEFAULT_SESSION_SECRET: &str = "dev-session-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_env() -> Self {
        match std::env::var("MG_SESSION_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => Self::new(secret.trim()),
            _ => {
                warn!("MG_SESSION_SECRET is not set, using the development secret");
                Self::new(DEFAULT_SESSION_SECRET)
            }
        }
    }

    /// Sign a session the way the account system does. Test fixtures only.
    #[cfg(test)]
    pub fn issue(&self, user_id: i64, ttl: Duration) -> jsonwebtoken::errors::Result<String> {
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify(&self, token: &str) -> Result<i64, SessionError> {
        let claims = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|decoded| decoded.claims)
        .map_err(|err| SessionError::Invalid(err.to_string()))?;

        claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|user_id| *user_id > 0)
            .ok_or_else(|| SessionError::Invalid(format!("Unsupported subject '{}'", claims.sub)))
    }

    /// Authenticated user of a request, if any
    pub fn resolve_user(&self, headers: &HeaderMap) -> Option<i64> {
        let token = bearer_token(headers)
            .map(str::to_string)
            .or_else(|| session_cookie(headers))?;
        match self.verify(&token) {
            Ok(user_id) => Some(user_id),
            Err(err) => {
                debug!("Treating request as anonymous: {}", err);
                None
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}
