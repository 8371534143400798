//! Token wire codec
//!
//! A token is the claims record as compact JSON, base64url encoded without
//! padding. It is obfuscated, not signed: every trust decision is re-derived
//! from live booking data on redemption.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;
use thiserror::Error;

use super::model::{Claims, REQUIRED_FIELDS};

/// Upper bound for an encoded token, in characters.
pub const MAX_TOKEN_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("Token exceeds maximum length ({len} > {max})")]
    TokenTooLong { len: usize, max: usize },
    #[error("Failed to decode token")]
    DecodeFailed,
    #[error("Invalid token data structure")]
    MalformedClaims,
    #[error("Missing required token field: {0}")]
    MissingField(&'static str),
}

pub fn encode(claims: &Claims) -> Result<String, ClaimsError> {
    let json = serde_json::to_vec(claims).map_err(|_| ClaimsError::MalformedClaims)?;
    let token = URL_SAFE_NO_PAD.encode(json);
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(ClaimsError::TokenTooLong {
            len: token.len(),
            max: MAX_TOKEN_LENGTH,
        });
    }
    Ok(token)
}

pub fn decode(token: &str) -> Result<Claims, ClaimsError> {
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(ClaimsError::TokenTooLong {
            len: token.len(),
            max: MAX_TOKEN_LENGTH,
        });
    }

    let raw = URL_SAFE_NO_PAD
        .decode(token.as_bytes())
        .map_err(|_| ClaimsError::DecodeFailed)?;
    let value: Value = serde_json::from_slice(&raw).map_err(|_| ClaimsError::MalformedClaims)?;
    let Value::Object(fields) = value else {
        return Err(ClaimsError::MalformedClaims);
    };

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| fields.get(**field).map_or(true, Value::is_null))
    {
        return Err(ClaimsError::MissingField(*missing));
    }

    serde_json::from_value(Value::Object(fields)).map_err(|_| ClaimsError::MalformedClaims)
}
