//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use meetgate_core::access::{MeetingAccess, TokenIssuer, TokenValidator};
use meetgate_core::booking::{BookingDirectory, FileBookingDirectory};
use meetgate_core::lifecycle::{LogNotifier, MeetingLifecycle};
use meetgate_core::meeting::MeetingRoomStore;
use meetgate_core::meta::FileMetaStore;
use meetgate_core::token::{MetaTokenStore, TokenStore};
use meetgate_core::AccessConfig;

use crate::session::SessionKeys;

/// Source of `now` for request handling
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(now) => now,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    data_dir: PathBuf,
    config: Arc<AccessConfig>,
    directory: FileBookingDirectory,
    access: MeetingAccess,
    lifecycle: MeetingLifecycle,
    sessions: SessionKeys,
    clock: Clock,
}

impl AppState {
    /// Create a new AppState with the given data directory
    pub async fn new(
        data_dir: PathBuf,
        config: AccessConfig,
        sessions: SessionKeys,
    ) -> meetgate_core::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;
        let meta = FileMetaStore::new(data_dir.join("booking_meta.json")).await?;
        let directory = FileBookingDirectory::new(data_dir.join("bookings.json")).await?;

        Ok(Self::with_stores(
            data_dir,
            config,
            directory,
            meta,
            sessions,
            Clock::System,
        ))
    }

    /// Wire the services over explicit stores
    pub fn with_stores(
        data_dir: PathBuf,
        config: AccessConfig,
        directory: FileBookingDirectory,
        meta: FileMetaStore,
        sessions: SessionKeys,
        clock: Clock,
    ) -> Self {
        let config = Arc::new(config);
        let shared_directory: Arc<dyn BookingDirectory> = Arc::new(directory.clone());
        let rooms = MeetingRoomStore::new(meta.clone());
        let tokens: Arc<dyn TokenStore> = Arc::new(MetaTokenStore::new(meta, config.token_ttl()));

        let validator = TokenValidator::new(shared_directory.clone(), rooms.clone());
        let issuer = TokenIssuer::new(config.clone(), tokens.clone(), validator);
        let access = MeetingAccess::new(
            config.clone(),
            shared_directory.clone(),
            rooms.clone(),
            issuer.clone(),
        );
        let lifecycle = MeetingLifecycle::new(
            config.clone(),
            shared_directory,
            rooms,
            tokens,
            issuer,
            Arc::new(LogNotifier),
        );

        Self {
            inner: Arc::new(AppStateInner {
                data_dir,
                config,
                directory,
                access,
                lifecycle,
                sessions,
                clock,
            }),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn config(&self) -> &AccessConfig {
        &self.inner.config
    }

    pub fn directory(&self) -> &FileBookingDirectory {
        &self.inner.directory
    }

    pub fn access(&self) -> &MeetingAccess {
        &self.inner.access
    }

    pub fn lifecycle(&self) -> &MeetingLifecycle {
        &self.inner.lifecycle
    }

    pub fn sessions(&self) -> &SessionKeys {
        &self.inner.sessions
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixture state shared by the route tests

    use chrono::{Duration, TimeZone};
    use meetgate_core::booking::{
        Attendee, Booking, BookingSnapshot, BookingStatus, Meeting, User,
    };
    use tempfile::TempDir;

    use super::*;

    pub const SITE: &str = "https://a.example";
    pub const BOOKING_ID: i64 = 100;
    pub const PENDING_BOOKING_ID: i64 = 101;
    pub const HOST_ID: i64 = 1;
    pub const ATTENDEE_ID: i64 = 2;
    pub const OUTSIDER_ID: i64 = 3;
    pub const SESSION_SECRET: &str = "test-session-secret";

    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn booking(id: i64, status: BookingStatus) -> Booking {
        Booking {
            id,
            meeting_id: Some(10),
            status,
            meeting_dates: "2024-01-01".to_string(),
            start_time: "10:00".to_string(),
            end_time: "10:30".to_string(),
            attendee_name: "Ada Attendee".to_string(),
            attendee_email: "ada@example.com".to_string(),
        }
    }

    pub fn snapshot() -> BookingSnapshot {
        BookingSnapshot {
            meetings: vec![Meeting {
                id: 10,
                user_id: HOST_ID,
                title: "Strategy Session".to_string(),
                duration: Some(30),
            }],
            bookings: vec![
                booking(BOOKING_ID, BookingStatus::Confirmed),
                booking(PENDING_BOOKING_ID, BookingStatus::Pending),
            ],
            attendees: vec![
                Attendee {
                    booking_id: BOOKING_ID,
                    user_id: Some(ATTENDEE_ID),
                    name: "Ada Attendee".to_string(),
                    email: "ada@example.com".to_string(),
                },
                Attendee {
                    booking_id: PENDING_BOOKING_ID,
                    user_id: Some(ATTENDEE_ID),
                    name: "Ada Attendee".to_string(),
                    email: "ada@example.com".to_string(),
                },
            ],
            users: vec![
                User {
                    id: HOST_ID,
                    display_name: "Hank Host".to_string(),
                    email: "host@example.com".to_string(),
                },
                User {
                    id: ATTENDEE_ID,
                    display_name: "Ada <Attendee>".to_string(),
                    email: "ada@example.com".to_string(),
                },
            ],
        }
    }

    pub fn config(testing_mode: bool) -> AccessConfig {
        AccessConfig {
            site_url: SITE.to_string(),
            testing_mode,
            secret_salt: "test-salt".to_string(),
            ..AccessConfig::default()
        }
    }

    /// State at a fixed clock with booking 100 already provisioned
    pub async fn build_state_with(now: DateTime<Utc>, config: AccessConfig) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let meta = FileMetaStore::new(data_dir.join("booking_meta.json"))
            .await
            .unwrap();
        let directory = FileBookingDirectory::from_snapshot(snapshot());

        let state = AppState::with_stores(
            data_dir,
            config,
            directory,
            meta,
            SessionKeys::new(SESSION_SECRET),
            Clock::Fixed(now),
        );
        state
            .lifecycle()
            .on_booking_confirmed(BOOKING_ID, at(8, 0))
            .await
            .unwrap();

        (state, temp_dir)
    }

    pub async fn build_state(now: DateTime<Utc>) -> (AppState, TempDir) {
        build_state_with(now, config(false)).await
    }

    pub fn session_for(state: &AppState, user_id: i64) -> String {
        state.sessions().issue(user_id, Duration::hours(1)).unwrap()
    }

    /// Token the confirmation step stored for `user_id`
    pub async fn stored_token(state: &AppState, user_id: i64) -> String {
        let ctx = state.access().context(at(8, 0), None);
        state
            .access()
            .issuer()
            .existing_token(BOOKING_ID, user_id, role_of(user_id), &ctx)
            .await
            .unwrap()
            .unwrap()
    }

    fn role_of(user_id: i64) -> meetgate_core::claims::Role {
        if user_id == HOST_ID {
            meetgate_core::claims::Role::Host
        } else {
            meetgate_core::claims::Role::Attendee
        }
    }
}
