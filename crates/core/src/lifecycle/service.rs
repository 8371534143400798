//! Meeting lifecycle service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::notifier::{Reminder, ReminderNotifier};
use super::scheduler::{ScheduledTask, TaskKind, TaskQueue};
use crate::access::{RequestContext, TokenIssuer};
use crate::booking::{BookingDetails, BookingDirectory};
use crate::claims::Role;
use crate::config::AccessConfig;
use crate::meeting::{MeetingRoom, MeetingRoomStore, MeetingWindow};
use crate::token::TokenStore;
use crate::{Error, Result};

#[derive(Clone)]
pub struct MeetingLifecycle {
    config: Arc<AccessConfig>,
    directory: Arc<dyn BookingDirectory>,
    rooms: MeetingRoomStore,
    tokens: Arc<dyn TokenStore>,
    issuer: TokenIssuer,
    queue: TaskQueue,
    notifier: Arc<dyn ReminderNotifier>,
}

impl MeetingLifecycle {
    pub fn new(
        config: Arc<AccessConfig>,
        directory: Arc<dyn BookingDirectory>,
        rooms: MeetingRoomStore,
        tokens: Arc<dyn TokenStore>,
        issuer: TokenIssuer,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> Self {
        Self {
            config,
            directory,
            rooms,
            tokens,
            issuer,
            queue: TaskQueue::new(),
            notifier,
        }
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Provision the room, issue tokens for every participant with an
    /// account and queue the meeting's scheduled tasks.
    pub async fn on_booking_confirmed(
        &self,
        booking_id: i64,
        now: DateTime<Utc>,
    ) -> Result<MeetingRoom> {
        let details = self
            .directory
            .booking(booking_id)
            .await?
            .ok_or(Error::BookingNotFound(booking_id))?;

        let room = MeetingRoom::provision(&details, &self.config.jitsi, now);
        self.rooms.put(booking_id, &room, now).await?;

        let issued = self.create_access_tokens(&details, now).await?;
        if let Err(err) = self.schedule_meeting_events(&details, now).await {
            warn!(booking_id, "Could not schedule meeting events: {}", err);
        }

        info!(
            booking_id,
            tokens = issued,
            meeting_url = %room.meeting_url,
            "Created meeting room"
        );
        Ok(room)
    }

    /// Host first; an attendee who is also the host gets no second token.
    async fn create_access_tokens(&self, details: &BookingDetails, now: DateTime<Utc>) -> Result<usize> {
        let booking_id = details.id();
        let ctx = RequestContext::new(now, self.config.site_url.clone());

        let mut participants = Vec::new();
        if let Some(host_id) = details.host_id {
            participants.push((host_id, Role::Host));
        }
        for user_id in self.directory.attendee_user_ids(booking_id).await? {
            if Some(user_id) != details.host_id {
                participants.push((user_id, Role::Attendee));
            }
        }

        let mut issued = 0;
        for (user_id, role) in participants {
            match self.issuer.issue(booking_id, user_id, role, &ctx).await {
                Ok(_) => issued += 1,
                Err(err) => warn!(
                    booking_id,
                    user_id,
                    code = err.code(),
                    "Could not create meeting token: {}",
                    err
                ),
            }
        }
        Ok(issued)
    }

    /// Queue reminder, terminate and cleanup for the parts of the meeting
    /// that are still in the future.
    pub async fn schedule_meeting_events(
        &self,
        details: &BookingDetails,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let booking_id = details.id();
        let window = MeetingWindow::from_booking(&details.booking, self.config.site_offset())?;

        let mut tasks = Vec::new();
        let reminder_at = window.end - self.config.reminder_lead();
        if reminder_at > now {
            tasks.push(ScheduledTask {
                run_at: reminder_at,
                booking_id,
                kind: TaskKind::Reminder,
            });
        }
        if window.end > now {
            tasks.push(ScheduledTask {
                run_at: window.end,
                booking_id,
                kind: TaskKind::Terminate,
            });
            tasks.push(ScheduledTask {
                run_at: window.end + self.config.cleanup_delay(),
                booking_id,
                kind: TaskKind::Cleanup,
            });
        }

        let mut queued = 0;
        for task in tasks {
            if self.queue.push(task).await {
                queued += 1;
            }
        }
        debug!(booking_id, queued, "Scheduled meeting events");
        Ok(queued)
    }

    /// Provision rooms for confirmed, not yet ended bookings that lack one.
    pub async fn create_missing_rooms(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut created = 0;
        for details in self.directory.confirmed_bookings().await? {
            let booking_id = details.id();
            if self.rooms.get(booking_id).await.is_some() {
                continue;
            }
            match MeetingWindow::from_booking(&details.booking, self.config.site_offset()) {
                Ok(window) if window.has_ended(now) => continue,
                Ok(_) => {}
                Err(err) => {
                    warn!(booking_id, "Skipping booking with unreadable schedule: {}", err);
                    continue;
                }
            }
            match self.on_booking_confirmed(booking_id, now).await {
                Ok(_) => created += 1,
                Err(err) => warn!(booking_id, "Could not create meeting room: {}", err),
            }
        }
        if created > 0 {
            info!(created, "Created meeting rooms for existing bookings");
        }
        Ok(created)
    }

    /// Remind confirmed meetings that end within the reminder lead.
    pub async fn check_reminders(&self, now: DateTime<Utc>) -> Result<usize> {
        let horizon = now + self.config.reminder_lead();
        let mut sent = 0;
        for details in self.directory.confirmed_bookings().await? {
            let Ok(window) = MeetingWindow::from_booking(&details.booking, self.config.site_offset())
            else {
                continue;
            };
            if window.end < now || window.end > horizon {
                continue;
            }
            if self.send_reminder(&details, now).await? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Once per booking. The marker is written before delivery is attempted.
    pub async fn send_reminder(&self, details: &BookingDetails, now: DateTime<Utc>) -> Result<bool> {
        let booking_id = details.id();
        if !self.rooms.mark_reminder_sent(booking_id, now).await? {
            return Ok(false);
        }

        let reminder = Reminder::for_booking(details, self.config.reminder_lead().num_minutes());
        if let Err(err) = self.notifier.send(&reminder).await {
            warn!(booking_id, "Failed to deliver meeting reminder: {}", err);
        } else {
            info!(booking_id, "Sent meeting reminder");
        }
        Ok(true)
    }

    /// Mark the meeting terminated and drop every token of the booking.
    /// `false` when there was nothing left to do.
    pub async fn cleanup_expired_meeting(&self, booking_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let terminated = self.rooms.mark_terminated(booking_id, now).await?;
        let removed = self.tokens.delete_all_for_booking(booking_id).await?;
        let changed = terminated || removed > 0;
        if changed {
            info!(booking_id, tokens_removed = removed, "Cleaned up expired meeting");
        }
        Ok(changed)
    }

    pub async fn terminate_meeting(&self, booking_id: i64, now: DateTime<Utc>) -> Result<bool> {
        info!(booking_id, "Terminating meeting room");
        self.cleanup_expired_meeting(booking_id, now).await
    }

    /// Clean up every confirmed booking whose meeting has ended, then purge
    /// expired token rows everywhere.
    pub async fn cleanup_all_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut cleaned = 0;
        for details in self.directory.confirmed_bookings().await? {
            let Ok(window) = MeetingWindow::from_booking(&details.booking, self.config.site_offset())
            else {
                continue;
            };
            if window.has_ended(now) && self.cleanup_expired_meeting(details.id(), now).await? {
                cleaned += 1;
            }
        }
        let purged = self.tokens.purge_expired(now).await?;
        if cleaned > 0 || purged > 0 {
            info!(cleaned, purged, "Expired meeting sweep finished");
        }
        Ok(cleaned)
    }

    /// Run every queued task that is due. A failing task is logged and does
    /// not stop the others.
    pub async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due = self.queue.take_due(now).await;
        let count = due.len();
        for task in due {
            if let Err(err) = self.run_task(task, now).await {
                warn!(
                    booking_id = task.booking_id,
                    kind = %task.kind,
                    "Scheduled task failed: {}",
                    err
                );
            }
        }
        count
    }

    async fn run_task(&self, task: ScheduledTask, now: DateTime<Utc>) -> Result<()> {
        match task.kind {
            TaskKind::Reminder => {
                if let Some(details) = self.directory.booking(task.booking_id).await? {
                    if details.is_confirmed() {
                        self.send_reminder(&details, now).await?;
                    }
                }
            }
            TaskKind::Terminate => {
                self.terminate_meeting(task.booking_id, now).await?;
            }
            TaskKind::Cleanup => {
                self.cleanup_expired_meeting(task.booking_id, now).await?;
            }
        }
        Ok(())
    }
}
