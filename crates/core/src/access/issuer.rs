//! Token issuance
//!
//! Issuance is idempotent: a stored token that is unexpired, issued for the
//! same role and still passes full validation is handed out again. Anything
//! else is deleted and replaced. A failed store write fails the issuance.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::RequestContext;
use super::error::AccessError;
use super::validator::TokenValidator;
use crate::claims::{self, Claims, Role};
use crate::config::AccessConfig;
use crate::nonce::NonceIssuer;
use crate::token::TokenStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// `<site>/meeting/<token>`
    pub url: String,
    pub reused: bool,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AccessConfig>,
    tokens: Arc<dyn TokenStore>,
    validator: TokenValidator,
    nonces: NonceIssuer,
}

impl TokenIssuer {
    pub fn new(
        config: Arc<AccessConfig>,
        tokens: Arc<dyn TokenStore>,
        validator: TokenValidator,
    ) -> Self {
        let nonces = NonceIssuer::new(config.secret_salt.clone());
        Self {
            config,
            tokens,
            validator,
            nonces,
        }
    }

    /// Build, encode and store a fresh token, replacing any prior entry.
    pub async fn issue(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        ctx: &RequestContext,
    ) -> Result<IssuedToken, AccessError> {
        if booking_id <= 0 {
            return Err(AccessError::InvalidBookingId);
        }
        if user_id <= 0 {
            return Err(AccessError::InvalidUserId);
        }

        let nonce = self.nonces.create(
            &NonceIssuer::meeting_action(booking_id, user_id),
            user_id,
            ctx.now,
        );
        let claims = Claims::new(
            booking_id,
            user_id,
            role,
            ctx.now,
            self.config.token_ttl(),
            ctx.site_identity.clone(),
        )
        .with_fingerprint(ctx.fingerprint.clone())
        .with_nonce(nonce);
        let token = claims::encode(&claims)?;

        if let Err(err) = self
            .tokens
            .put(booking_id, user_id, role, &token, ctx.now)
            .await
        {
            warn!(booking_id, user_id, "Failed to store meeting token: {}", err);
            return Err(AccessError::StorageFailed(err.to_string()));
        }

        info!(booking_id, user_id, role = %role, "Issued meeting token");
        Ok(IssuedToken {
            url: self.config.meeting_page_url(&token),
            token,
            reused: false,
        })
    }

    /// Stored token for the pair if it is still usable for `role`.
    /// Unusable entries are deleted on the way.
    pub async fn existing_token(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        ctx: &RequestContext,
    ) -> Result<Option<String>, AccessError> {
        let Some(stored) = self.tokens.get(booking_id, user_id).await? else {
            return Ok(None);
        };

        if stored.is_expired_at(ctx.now) || stored.role != role {
            self.tokens.delete(booking_id, user_id).await?;
            debug!(booking_id, user_id, "Discarded stale meeting token");
            return Ok(None);
        }

        match self.validator.validate(&stored.token, ctx).await {
            Ok(access)
                if access.claims.booking_id == booking_id && access.claims.user_id == user_id =>
            {
                Ok(Some(stored.token))
            }
            Ok(_) => {
                self.tokens.delete(booking_id, user_id).await?;
                Ok(None)
            }
            Err(err) => {
                debug!(
                    booking_id,
                    user_id,
                    code = err.code(),
                    "Stored meeting token no longer validates"
                );
                self.tokens.delete(booking_id, user_id).await?;
                Ok(None)
            }
        }
    }

    pub async fn issue_or_reuse(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        ctx: &RequestContext,
    ) -> Result<IssuedToken, AccessError> {
        if let Some(token) = self.existing_token(booking_id, user_id, role, ctx).await? {
            return Ok(IssuedToken {
                url: self.config.meeting_page_url(&token),
                token,
                reused: true,
            });
        }
        self.issue(booking_id, user_id, role, ctx).await
    }

    pub async fn generate_secure_meeting_url(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        ctx: &RequestContext,
    ) -> Result<String, AccessError> {
        Ok(self.issue_or_reuse(booking_id, user_id, role, ctx).await?.url)
    }
}
