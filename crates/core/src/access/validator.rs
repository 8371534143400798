//! Token validator
//!
//! Checks run cheapest first and the first failure is terminal:
//! format, decode, required fields, expiry, site, fingerprint (advisory),
//! booking, membership, meeting room.

use std::sync::Arc;

use tracing::{debug, warn};

use super::context::RequestContext;
use super::error::AccessError;
use crate::booking::{BookingDetails, BookingDirectory};
use crate::claims::{self, Claims, Role, MAX_TOKEN_LENGTH};
use crate::meeting::{MeetingRoom, MeetingRoomStore};

/// A token that passed every check, with the live records it refers to
#[derive(Debug, Clone)]
pub struct ValidatedAccess {
    pub claims: Claims,
    pub booking: BookingDetails,
    pub room: MeetingRoom,
    /// Live relation of `claims.user_id` to the booking
    pub membership: Role,
}

#[derive(Clone)]
pub struct TokenValidator {
    directory: Arc<dyn BookingDirectory>,
    rooms: MeetingRoomStore,
}

impl TokenValidator {
    pub fn new(directory: Arc<dyn BookingDirectory>, rooms: MeetingRoomStore) -> Self {
        Self { directory, rooms }
    }

    pub async fn validate(
        &self,
        token: &str,
        ctx: &RequestContext,
    ) -> Result<ValidatedAccess, AccessError> {
        let token = token.trim();
        if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
            return Err(AccessError::InvalidFormat);
        }

        let claims = claims::decode(token)?;

        if claims.is_expired_at(ctx.now) {
            return Err(AccessError::TokenExpired);
        }

        if !same_site(&claims.site_identity, &ctx.site_identity) {
            return Err(AccessError::InvalidSite);
        }

        if let (Some(issued), Some(current)) = (&claims.client_fingerprint, &ctx.fingerprint) {
            if issued != current {
                warn!(
                    booking_id = claims.booking_id,
                    user_id = claims.user_id,
                    "User agent mismatch for meeting token"
                );
            }
        }

        let booking = self
            .directory
            .booking(claims.booking_id)
            .await?
            .ok_or(AccessError::BookingNotFound)?;

        let membership = self
            .directory
            .membership(claims.booking_id, claims.user_id)
            .await?
            .ok_or(AccessError::AccessDenied)?;

        let room = self
            .rooms
            .get(claims.booking_id)
            .await
            .ok_or(AccessError::MeetingNotFound)?;

        debug!(
            booking_id = claims.booking_id,
            user_id = claims.user_id,
            "Meeting token validated"
        );
        Ok(ValidatedAccess {
            claims,
            booking,
            room,
            membership,
        })
    }
}

fn same_site(issued: &str, current: &str) -> bool {
    issued.trim_end_matches('/') == current.trim_end_matches('/')
}
