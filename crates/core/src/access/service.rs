//! Access orchestrator
//!
//! The three redemption entry points over one shared core.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::context::RequestContext;
use super::error::AccessError;
use super::issuer::TokenIssuer;
use super::validator::TokenValidator;
use crate::booking::{BookingDetails, BookingDirectory};
use crate::claims::Role;
use crate::config::AccessConfig;
use crate::meeting::{MeetingRoom, MeetingRoomStore, MeetingStatus, MeetingWindow};
use crate::nonce::{NonceIssuer, DASHBOARD_NONCE_ACTION};

/// Everything a meeting page needs to render
#[derive(Debug, Clone)]
pub struct MeetingPage {
    pub booking: BookingDetails,
    pub room: MeetingRoom,
    pub window: MeetingWindow,
    pub status: MeetingStatus,
    pub user_id: i64,
    pub display_name: String,
    /// Role asserted by the token; drives moderator affordances only
    pub role: Role,
    /// Room path for the external API (JaaS rooms carry the tenant)
    pub room_path: String,
    pub domain: String,
    pub language: String,
    pub seconds_until_open: i64,
    pub testing_mode: bool,
}

#[derive(Debug, Clone)]
pub enum PageView {
    Waiting(MeetingPage),
    Ended(MeetingPage),
    /// Joinable or active
    Live(MeetingPage),
}

impl PageView {
    pub fn page(&self) -> &MeetingPage {
        match self {
            Self::Waiting(page) | Self::Ended(page) | Self::Live(page) => page,
        }
    }
}

/// Same-origin join payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinGrant {
    pub meeting_url: String,
    pub room_name: String,
    pub role: Role,
    pub booking_id: i64,
}

/// Network API payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingLink {
    pub meeting_url: String,
    pub room_name: String,
    pub role: Role,
    pub booking_id: i64,
    pub meeting_status: MeetingStatus,
    /// Unix seconds
    pub meeting_start: i64,
    pub meeting_end: i64,
    pub testing_mode: bool,
}

#[derive(Clone)]
pub struct MeetingAccess {
    config: Arc<AccessConfig>,
    directory: Arc<dyn BookingDirectory>,
    rooms: MeetingRoomStore,
    validator: TokenValidator,
    issuer: TokenIssuer,
    nonces: NonceIssuer,
}

impl MeetingAccess {
    pub fn new(
        config: Arc<AccessConfig>,
        directory: Arc<dyn BookingDirectory>,
        rooms: MeetingRoomStore,
        issuer: TokenIssuer,
    ) -> Self {
        let validator = TokenValidator::new(directory.clone(), rooms.clone());
        let nonces = NonceIssuer::new(config.secret_salt.clone());
        Self {
            config,
            directory,
            rooms,
            validator,
            issuer,
            nonces,
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn context(&self, now: DateTime<Utc>, user_agent: Option<&str>) -> RequestContext {
        RequestContext::new(now, self.config.site_url.clone())
            .with_user_agent(user_agent, &self.config.secret_salt)
    }

    /// Nonce the attendee dashboard sends back with join requests
    pub fn dashboard_nonce(&self, user_id: i64, now: DateTime<Utc>) -> String {
        self.nonces.create(DASHBOARD_NONCE_ACTION, user_id, now)
    }

    /// decode, validate, session match, then resolve status
    pub async fn open_meeting_page(
        &self,
        token: &str,
        session_user: Option<i64>,
        ctx: &RequestContext,
    ) -> Result<PageView, AccessError> {
        let access = self
            .validator
            .validate(token, ctx)
            .await
            .map_err(|err| {
                warn!(code = err.code(), "Rejected meeting token: {}", err);
                err
            })?;

        let Some(user_id) = session_user else {
            warn!(booking_id = access.claims.booking_id, "Meeting page requested without a session");
            return Err(AccessError::AuthenticationRequired);
        };
        if user_id != access.claims.user_id {
            warn!(
                booking_id = access.claims.booking_id,
                user_id,
                token_user_id = access.claims.user_id,
                "Meeting token presented by another account"
            );
            return Err(AccessError::UserMismatch);
        }

        let window = self.window_for(&access.booking)?;
        let terminated = access.room.terminated || self.rooms.is_terminated(access.booking.id()).await;
        let status = window.status(
            ctx.now,
            self.config.grace_period(),
            terminated,
            self.config.testing_mode,
        );

        let display_name = match self.directory.user(user_id).await? {
            Some(user) if !user.display_name.is_empty() => user.display_name,
            _ => "Participant".to_string(),
        };

        let page = MeetingPage {
            room_path: access.room.qualified_room_name(&self.config.jitsi),
            domain: access.room.domain.clone(),
            language: self.config.jitsi.language.clone(),
            seconds_until_open: window.seconds_until_open(ctx.now, self.config.grace_period()),
            testing_mode: self.config.testing_mode,
            booking: access.booking,
            room: access.room,
            window,
            status,
            user_id,
            display_name,
            role: access.claims.role,
        };

        info!(
            booking_id = page.booking.id(),
            user_id,
            status = %status,
            "Serving meeting page"
        );
        Ok(match status {
            MeetingStatus::Waiting => PageView::Waiting(page),
            MeetingStatus::Ended => PageView::Ended(page),
            MeetingStatus::Joinable | MeetingStatus::Active => PageView::Live(page),
        })
    }

    /// Same-origin join: nonce, session, membership, room, then issuance
    pub async fn join_meeting(
        &self,
        booking_id: i64,
        nonce: &str,
        session_user: Option<i64>,
        ctx: &RequestContext,
    ) -> Result<JoinGrant, AccessError> {
        if !self.nonces.verify(
            nonce,
            DASHBOARD_NONCE_ACTION,
            session_user.unwrap_or(0),
            ctx.now,
        ) {
            return Err(AccessError::NonceFailed);
        }
        if booking_id <= 0 {
            return Err(AccessError::InvalidBookingId);
        }
        let user_id = session_user.ok_or(AccessError::AuthenticationRequired)?;

        let role = self
            .directory
            .membership(booking_id, user_id)
            .await?
            .ok_or(AccessError::AccessDenied)?;
        let room = self
            .rooms
            .get(booking_id)
            .await
            .ok_or(AccessError::MeetingNotFound)?;

        let issued = self
            .issuer
            .issue_or_reuse(booking_id, user_id, role, ctx)
            .await?;

        info!(booking_id, user_id, role = %role, "Generated meeting link for join request");
        Ok(JoinGrant {
            meeting_url: issued.url,
            room_name: room.room_name,
            role,
            booking_id,
        })
    }

    /// Network API: permission first, then booking state and the join window
    pub async fn meeting_link(
        &self,
        booking_id: i64,
        session_user: Option<i64>,
        ctx: &RequestContext,
    ) -> Result<MeetingLink, AccessError> {
        let user_id = session_user.ok_or(AccessError::AuthenticationRequired)?;
        let role = self
            .directory
            .membership(booking_id, user_id)
            .await?
            .ok_or(AccessError::AccessDenied)?;

        let booking = self
            .directory
            .booking(booking_id)
            .await?
            .ok_or(AccessError::BookingNotFound)?;
        if !booking.is_confirmed() {
            return Err(AccessError::BookingNotConfirmed);
        }
        let room = self
            .rooms
            .get(booking_id)
            .await
            .ok_or(AccessError::MeetingNotFound)?;

        let window = self.window_for(&booking)?;
        let terminated = room.terminated || self.rooms.is_terminated(booking_id).await;
        let testing_mode = self.config.testing_mode;
        if !testing_mode {
            let lead = self.config.api_join_lead();
            if ctx.now < window.start - lead {
                return Err(AccessError::MeetingNotAvailable {
                    lead_minutes: lead.num_minutes(),
                });
            }
            if terminated || window.has_ended(ctx.now) {
                return Err(AccessError::MeetingEnded);
            }
        }

        let issued = self
            .issuer
            .issue_or_reuse(booking_id, user_id, role, ctx)
            .await?;

        Ok(MeetingLink {
            meeting_url: issued.url,
            room_name: room.room_name,
            role,
            booking_id,
            meeting_status: window.status(
                ctx.now,
                self.config.grace_period(),
                terminated,
                testing_mode,
            ),
            meeting_start: window.start.timestamp(),
            meeting_end: window.end.timestamp(),
            testing_mode,
        })
    }

    fn window_for(&self, booking: &BookingDetails) -> Result<MeetingWindow, AccessError> {
        MeetingWindow::from_booking(&booking.booking, self.config.site_offset()).map_err(|err| {
            warn!(booking_id = booking.id(), "Unable to read meeting schedule: {}", err);
            AccessError::StatusUnavailable
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::JitsiConfig;
    use crate::meta::FileMetaStore;
    use crate::testing::{
        at, sample_directory, ATTENDEE_ID, BOOKING_ID, HOST_ID, OUTSIDER_ID, PENDING_BOOKING_ID,
        SITE,
    };
    use crate::token::MetaTokenStore;
    use tempfile::TempDir;

    async fn access_with(temp_dir: &TempDir, config: AccessConfig) -> MeetingAccess {
        let config = Arc::new(config);
        let meta = FileMetaStore::new(temp_dir.path().join("meta.json"))
            .await
            .unwrap();
        let rooms = MeetingRoomStore::new(meta.clone());
        let directory: Arc<dyn BookingDirectory> = Arc::new(sample_directory());
        let details = directory.booking(BOOKING_ID).await.unwrap().unwrap();
        rooms
            .put(
                BOOKING_ID,
                &MeetingRoom::provision(&details, &JitsiConfig::default(), at(8, 0)),
                at(8, 0),
            )
            .await
            .unwrap();

        let tokens = Arc::new(MetaTokenStore::new(meta, config.token_ttl()));
        let validator = TokenValidator::new(directory.clone(), rooms.clone());
        let issuer = TokenIssuer::new(config.clone(), tokens, validator);
        MeetingAccess::new(config, directory, rooms, issuer)
    }

    async fn access(temp_dir: &TempDir) -> MeetingAccess {
        access_with(
            temp_dir,
            AccessConfig {
                site_url: SITE.to_string(),
                ..AccessConfig::default()
            },
        )
        .await
    }

    async fn token_for(access: &MeetingAccess, user_id: i64, role: Role) -> String {
        access
            .issuer()
            .issue(BOOKING_ID, user_id, role, &access.context(at(8, 0), None))
            .await
            .unwrap()
            .token
    }

    #[tokio::test]
    async fn page_follows_the_meeting_timeline() {
        let temp_dir = TempDir::new().unwrap();
        let access = access(&temp_dir).await;
        let token = token_for(&access, ATTENDEE_ID, Role::Attendee).await;

        let view = access
            .open_meeting_page(&token, Some(ATTENDEE_ID), &access.context(at(9, 30), None))
            .await
            .unwrap();
        assert!(matches!(view, PageView::Waiting(_)));
        assert_eq!(view.page().seconds_until_open, 15 * 60);

        let view = access
            .open_meeting_page(&token, Some(ATTENDEE_ID), &access.context(at(9, 50), None))
            .await
            .unwrap();
        assert!(matches!(view, PageView::Live(_)));
        assert_eq!(view.page().status, MeetingStatus::Joinable);
        assert_eq!(view.page().display_name, "Ada Attendee");
        assert_eq!(view.page().role, Role::Attendee);

        let view = access
            .open_meeting_page(&token, Some(ATTENDEE_ID), &access.context(at(10, 31), None))
            .await
            .unwrap();
        assert!(matches!(view, PageView::Ended(_)));
    }

    #[tokio::test]
    async fn page_requires_the_token_owner_session() {
        let temp_dir = TempDir::new().unwrap();
        let access = access(&temp_dir).await;
        let token = token_for(&access, ATTENDEE_ID, Role::Attendee).await;
        let ctx = access.context(at(10, 0), None);

        assert_eq!(
            access.open_meeting_page(&token, None, &ctx).await.unwrap_err(),
            AccessError::AuthenticationRequired
        );
        assert_eq!(
            access
                .open_meeting_page(&token, Some(HOST_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::UserMismatch
        );
    }

    #[tokio::test]
    async fn terminated_rooms_render_ended_even_in_testing_mode() {
        let temp_dir = TempDir::new().unwrap();
        let access = access_with(
            &temp_dir,
            AccessConfig {
                site_url: SITE.to_string(),
                testing_mode: true,
                ..AccessConfig::default()
            },
        )
        .await;
        let token = token_for(&access, HOST_ID, Role::Host).await;
        let ctx = access.context(at(6, 0), None);

        let view = access
            .open_meeting_page(&token, Some(HOST_ID), &ctx)
            .await
            .unwrap();
        assert!(matches!(view, PageView::Live(_)));

        access.rooms.mark_terminated(BOOKING_ID, at(6, 0)).await.unwrap();
        let view = access
            .open_meeting_page(&token, Some(HOST_ID), &ctx)
            .await
            .unwrap();
        assert!(matches!(view, PageView::Ended(_)));
    }

    #[tokio::test]
    async fn join_checks_nonce_session_and_membership() {
        let temp_dir = TempDir::new().unwrap();
        let access = access(&temp_dir).await;
        let ctx = access.context(at(9, 0), None);
        let nonce = access.dashboard_nonce(ATTENDEE_ID, at(9, 0));

        assert_eq!(
            access
                .join_meeting(BOOKING_ID, "bogus", Some(ATTENDEE_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::NonceFailed
        );
        assert_eq!(
            access
                .join_meeting(0, &nonce, Some(ATTENDEE_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::InvalidBookingId
        );
        let anonymous_nonce = access.dashboard_nonce(0, at(9, 0));
        assert_eq!(
            access
                .join_meeting(BOOKING_ID, &anonymous_nonce, None, &ctx)
                .await
                .unwrap_err(),
            AccessError::AuthenticationRequired
        );
        let outsider_nonce = access.dashboard_nonce(OUTSIDER_ID, at(9, 0));
        assert_eq!(
            access
                .join_meeting(BOOKING_ID, &outsider_nonce, Some(OUTSIDER_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::AccessDenied
        );

        let grant = access
            .join_meeting(BOOKING_ID, &nonce, Some(ATTENDEE_ID), &ctx)
            .await
            .unwrap();
        assert_eq!(grant.role, Role::Attendee);
        assert_eq!(grant.booking_id, BOOKING_ID);
        assert!(grant.meeting_url.starts_with("https://a.example/meeting/"));
        assert!(grant.room_name.starts_with("meeting-100-"));

        let again = access
            .join_meeting(BOOKING_ID, &nonce, Some(ATTENDEE_ID), &ctx)
            .await
            .unwrap();
        assert_eq!(again.meeting_url, grant.meeting_url);
    }

    #[tokio::test]
    async fn api_link_enforces_its_own_window() {
        let temp_dir = TempDir::new().unwrap();
        let access = access(&temp_dir).await;

        assert_eq!(
            access
                .meeting_link(BOOKING_ID, Some(HOST_ID), &access.context(at(9, 50), None))
                .await
                .unwrap_err(),
            AccessError::MeetingNotAvailable { lead_minutes: 5 }
        );

        let link = access
            .meeting_link(BOOKING_ID, Some(HOST_ID), &access.context(at(9, 56), None))
            .await
            .unwrap();
        assert_eq!(link.role, Role::Host);
        assert_eq!(link.meeting_status, MeetingStatus::Joinable);
        assert_eq!(link.meeting_start, at(10, 0).timestamp());
        assert_eq!(link.meeting_end, at(10, 30).timestamp());
        assert!(!link.testing_mode);

        assert_eq!(
            access
                .meeting_link(BOOKING_ID, Some(HOST_ID), &access.context(at(10, 31), None))
                .await
                .unwrap_err(),
            AccessError::MeetingEnded
        );
    }

    #[tokio::test]
    async fn api_link_rejections() {
        let temp_dir = TempDir::new().unwrap();
        let access = access(&temp_dir).await;
        let ctx = access.context(at(10, 0), None);

        assert_eq!(
            access.meeting_link(BOOKING_ID, None, &ctx).await.unwrap_err(),
            AccessError::AuthenticationRequired
        );
        assert_eq!(
            access
                .meeting_link(BOOKING_ID, Some(OUTSIDER_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::AccessDenied
        );
        assert_eq!(
            access
                .meeting_link(PENDING_BOOKING_ID, Some(ATTENDEE_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::BookingNotConfirmed
        );

        access.rooms.mark_terminated(BOOKING_ID, at(10, 5)).await.unwrap();
        assert_eq!(
            access
                .meeting_link(BOOKING_ID, Some(ATTENDEE_ID), &ctx)
                .await
                .unwrap_err(),
            AccessError::MeetingEnded
        );
    }

    #[tokio::test]
    async fn testing_mode_skips_the_api_window() {
        let temp_dir = TempDir::new().unwrap();
        let access = access_with(
            &temp_dir,
            AccessConfig {
                site_url: SITE.to_string(),
                testing_mode: true,
                ..AccessConfig::default()
            },
        )
        .await;

        let link = access
            .meeting_link(BOOKING_ID, Some(ATTENDEE_ID), &access.context(at(6, 0), None))
            .await
            .unwrap();
        assert!(link.testing_mode);
        assert_eq!(link.meeting_status, MeetingStatus::Active);
    }
}
