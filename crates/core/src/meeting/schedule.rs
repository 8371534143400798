//! Scheduled meeting window
//!
//! Bookings store wall-clock dates; they are read at the site's offset and
//! compared in UTC from then on.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::status::{resolve_with_grace, MeetingStatus};
use crate::booking::Booking;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MeetingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// An end time earlier than the start belongs to the following day.
    pub fn from_booking(booking: &Booking, offset: FixedOffset) -> Result<Self> {
        let date = NaiveDate::parse_from_str(booking.meeting_dates.trim(), "%Y-%m-%d")
            .map_err(|_| {
                Error::InvalidInput(format!(
                    "Booking {} has an invalid meeting date '{}'",
                    booking.id, booking.meeting_dates
                ))
            })?;
        let start_time = parse_time(&booking.start_time, booking.id)?;
        let end_time = parse_time(&booking.end_time, booking.id)?;

        let start = to_utc(date.and_time(start_time), offset, booking.id)?;
        let mut end = to_utc(date.and_time(end_time), offset, booking.id)?;
        if end < start {
            end += Duration::days(1);
        }
        Ok(Self { start, end })
    }

    pub fn status(
        &self,
        now: DateTime<Utc>,
        grace: Duration,
        terminated: bool,
        override_active: bool,
    ) -> MeetingStatus {
        resolve_with_grace(now, self.start, self.end, grace, terminated, override_active)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// Seconds until `start - lead`, zero once that moment has passed
    pub fn seconds_until_open(&self, now: DateTime<Utc>, lead: Duration) -> i64 {
        ((self.start - lead) - now).num_seconds().max(0)
    }
}

fn parse_time(raw: &str, booking_id: i64) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| {
            Error::InvalidInput(format!(
                "Booking {} has an invalid meeting time '{}'",
                booking_id, raw
            ))
        })
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset, booking_id: i64) -> Result<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            Error::InvalidInput(format!("Booking {} has an ambiguous local time", booking_id))
        })
}
