//! Room records and lifecycle markers in the booking meta table

use chrono::{DateTime, Utc};
use tracing::debug;

use super::room::MeetingRoom;
use crate::meta::{FileMetaStore, MetaKey};
use crate::Result;

#[derive(Clone)]
pub struct MeetingRoomStore {
    meta: FileMetaStore,
}

impl MeetingRoomStore {
    pub fn new(meta: FileMetaStore) -> Self {
        Self { meta }
    }

    pub async fn get(&self, booking_id: i64) -> Option<MeetingRoom> {
        self.meta.get_value(booking_id, MetaKey::JitsiMeeting).await
    }

    pub async fn put(&self, booking_id: i64, room: &MeetingRoom, now: DateTime<Utc>) -> Result<()> {
        self.meta
            .replace(booking_id, MetaKey::JitsiMeeting, room, now)
            .await?;
        debug!(booking_id, room = %room.room_name, "Stored meeting room");
        Ok(())
    }

    /// Either the room flag or the standalone marker counts.
    pub async fn is_terminated(&self, booking_id: i64) -> bool {
        if self.meta.contains(booking_id, MetaKey::MeetingTerminated).await {
            return true;
        }
        self.get(booking_id)
            .await
            .map(|room| room.terminated)
            .unwrap_or(false)
    }

    /// Flag the room and write the marker. Returns `false` when both were
    /// already in place.
    pub async fn mark_terminated(&self, booking_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let mut changed = false;

        if let Some(mut room) = self.get(booking_id).await {
            if !room.terminated {
                room.terminated = true;
                room.terminated_at = Some(now);
                self.put(booking_id, &room, now).await?;
                changed = true;
            }
        }

        if !self.meta.contains(booking_id, MetaKey::MeetingTerminated).await {
            self.meta
                .replace(booking_id, MetaKey::MeetingTerminated, &now, now)
                .await?;
            changed = true;
        }

        Ok(changed)
    }

    pub async fn reminder_sent(&self, booking_id: i64) -> bool {
        self.meta.contains(booking_id, MetaKey::ReminderSent).await
    }

    /// Returns `false` when the reminder was already recorded.
    pub async fn mark_reminder_sent(&self, booking_id: i64, now: DateTime<Utc>) -> Result<bool> {
        if self.reminder_sent(booking_id).await {
            return Ok(false);
        }
        self.meta
            .replace(booking_id, MetaKey::ReminderSent, &now, now)
            .await?;
        Ok(true)
    }
}
