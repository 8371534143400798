//! Booking model definitions

use serde::{Deserialize, Serialize};

/// Booking status in the external booking store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
}

impl Default for BookingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A bookable meeting type, owned by its host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    /// Host user id
    pub user_id: i64,
    pub title: String,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(default)]
    pub meeting_id: Option<i64>,
    #[serde(default)]
    pub status: BookingStatus,
    /// `YYYY-MM-DD`
    pub meeting_dates: String,
    /// `HH:MM` or `HH:MM:SS`
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub attendee_name: String,
    #[serde(default)]
    pub attendee_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub booking_id: i64,
    /// Guests without an account have no user id
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

/// A booking joined with its meeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetails {
    pub booking: Booking,
    pub meeting_title: Option<String>,
    pub duration: Option<u32>,
    pub host_id: Option<i64>,
}

impl BookingDetails {
    pub fn id(&self) -> i64 {
        self.booking.id
    }

    pub fn title(&self) -> &str {
        self.meeting_title.as_deref().unwrap_or("Meeting")
    }

    pub fn is_confirmed(&self) -> bool {
        self.booking.status == BookingStatus::Confirmed
    }
}

/// Serialized form of the whole directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSnapshot {
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub users: Vec<User>,
}
