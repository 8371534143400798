//! File-based booking directory
//!
//! Loads a JSON snapshot of the external booking store. The directory never
//! writes; `reload` picks up a new snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::directory::BookingDirectory;
use super::model::{BookingDetails, BookingSnapshot, BookingStatus, User};
use crate::{Error, Result};

#[derive(Clone)]
pub struct FileBookingDirectory {
    snapshot: Arc<RwLock<BookingSnapshot>>,
    file_path: Option<PathBuf>,
}

impl FileBookingDirectory {
    /// Load the snapshot at `file_path`; a missing file is an empty directory
    pub async fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let snapshot = load_snapshot(&file_path).await?;
        info!(
            bookings = snapshot.bookings.len(),
            "Loaded booking directory from {}",
            file_path.display()
        );
        Ok(Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            file_path: Some(file_path),
        })
    }

    /// In-memory directory, not backed by a file
    pub fn from_snapshot(snapshot: BookingSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            file_path: None,
        }
    }

    pub async fn reload(&self) -> Result<()> {
        let Some(path) = self.file_path.as_ref() else {
            return Ok(());
        };
        let snapshot = load_snapshot(path).await?;
        *self.snapshot.write().await = snapshot;
        Ok(())
    }

    pub async fn replace_snapshot(&self, snapshot: BookingSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

async fn load_snapshot(path: &Path) -> Result<BookingSnapshot> {
    if !path.exists() {
        return Ok(BookingSnapshot::default());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to read bookings file: {}", e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Storage(format!("Failed to parse bookings file: {}", e)))
}

fn details_for(snapshot: &BookingSnapshot, booking_id: i64) -> Option<BookingDetails> {
    let booking = snapshot
        .bookings
        .iter()
        .find(|booking| booking.id == booking_id)?
        .clone();
    let meeting = booking
        .meeting_id
        .and_then(|meeting_id| snapshot.meetings.iter().find(|m| m.id == meeting_id));

    Some(BookingDetails {
        meeting_title: meeting.map(|m| m.title.clone()),
        duration: meeting.and_then(|m| m.duration),
        host_id: meeting.map(|m| m.user_id),
        booking,
    })
}

#[async_trait]
impl BookingDirectory for FileBookingDirectory {
    async fn booking(&self, booking_id: i64) -> Result<Option<BookingDetails>> {
        let snapshot = self.snapshot.read().await;
        Ok(details_for(&snapshot, booking_id))
    }

    async fn host_id(&self, booking_id: i64) -> Result<Option<i64>> {
        let snapshot = self.snapshot.read().await;
        Ok(details_for(&snapshot, booking_id).and_then(|details| details.host_id))
    }

    async fn attendee_user_ids(&self, booking_id: i64) -> Result<Vec<i64>> {
        let snapshot = self.snapshot.read().await;
        let mut user_ids: Vec<i64> = snapshot
            .attendees
            .iter()
            .filter(|attendee| attendee.booking_id == booking_id)
            .filter_map(|attendee| attendee.user_id)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        Ok(user_ids)
    }

    async fn user(&self, user_id: i64) -> Result<Option<User>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.users.iter().find(|user| user.id == user_id).cloned())
    }

    async fn confirmed_bookings(&self) -> Result<Vec<BookingDetails>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Confirmed)
            .filter_map(|booking| details_for(&snapshot, booking.id))
            .collect())
    }
}
