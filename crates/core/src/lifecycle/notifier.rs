//! End-of-meeting reminders
//!
//! Delivery is external; the default notifier only logs.

use async_trait::async_trait;
use tracing::info;

use crate::booking::BookingDetails;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub booking_id: i64,
    pub recipient_name: String,
    pub recipient_email: String,
    pub meeting_dates: String,
    pub start_time: String,
    pub end_time: String,
    pub minutes_remaining: i64,
}

impl Reminder {
    pub fn for_booking(details: &BookingDetails, minutes_remaining: i64) -> Self {
        let booking = &details.booking;
        Self {
            booking_id: booking.id,
            recipient_name: booking.attendee_name.clone(),
            recipient_email: booking.attendee_email.clone(),
            meeting_dates: booking.meeting_dates.clone(),
            start_time: booking.start_time.clone(),
            end_time: booking.end_time.clone(),
            minutes_remaining,
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Meeting Ending Soon - {} Minutes Remaining",
            self.minutes_remaining
        )
    }

    pub fn body(&self) -> String {
        format!(
            "Hello {},\n\nYour meeting is scheduled to end in {} minutes.\n\n\
             Meeting Details:\nDate: {}\nTime: {} - {}\n\n\
             Please wrap up your discussion.\n\nThank you!",
            self.recipient_name,
            self.minutes_remaining,
            self.meeting_dates,
            self.start_time,
            self.end_time
        )
    }
}

#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn send(&self, reminder: &Reminder) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ReminderNotifier for LogNotifier {
    async fn send(&self, reminder: &Reminder) -> Result<()> {
        info!(
            booking_id = reminder.booking_id,
            to = %reminder.recipient_email,
            subject = %reminder.subject(),
            "Meeting reminder"
        );
        Ok(())
    }
}
