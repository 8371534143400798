//! Shared fixtures for unit tests

use chrono::{DateTime, TimeZone, Utc};

use crate::booking::{
    Attendee, Booking, BookingSnapshot, BookingStatus, FileBookingDirectory, Meeting, User,
};

pub const SITE: &str = "https://a.example";
pub const MEETING_ID: i64 = 10;
pub const BOOKING_ID: i64 = 100;
pub const PENDING_BOOKING_ID: i64 = 101;
pub const HOST_ID: i64 = 1;
pub const ATTENDEE_ID: i64 = 2;
pub const OUTSIDER_ID: i64 = 3;

/// 2024-01-01 at the given UTC wall-clock time
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid fixture time {}:{}", hour, minute))
}

fn booking(id: i64, status: BookingStatus) -> Booking {
    Booking {
        id,
        meeting_id: Some(MEETING_ID),
        status,
        meeting_dates: "2024-01-01".to_string(),
        start_time: "10:00".to_string(),
        end_time: "10:30".to_string(),
        attendee_name: "Ada Attendee".to_string(),
        attendee_email: "ada@example.com".to_string(),
    }
}

/// Meeting 10 hosted by user 1; booking 100 confirmed 10:00-10:30 UTC with
/// user 2 and one guest attending; booking 101 still pending.
pub fn sample_snapshot() -> BookingSnapshot {
    BookingSnapshot {
        meetings: vec![Meeting {
            id: MEETING_ID,
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
                booking_id: BOOKING_ID,
                user_id: None,
                name: "Guest".to_string(),
                email: "guest@example.com".to_string(),
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
                display_name: "Ada Attendee".to_string(),
                email: "ada@example.com".to_string(),
            },
            User {
                id: OUTSIDER_ID,
                display_name: "Otto Outsider".to_string(),
                email: "otto@example.com".to_string(),
            },
        ],
    }
}

pub fn sample_directory() -> FileBookingDirectory {
    FileBookingDirectory::from_snapshot(sample_snapshot())
}
