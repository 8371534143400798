//! Meta entry definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MEETING_TOKEN_PREFIX: &str = "meeting_token_";

const JITSI_MEETING_KEY: &str = "jitsi_meeting";
const REMINDER_SENT_KEY: &str = "reminder_sent";
const MEETING_TERMINATED_KEY: &str = "meeting_terminated";

/// Reserved keys of the booking meta table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// Stored token of one participant
    MeetingToken(i64),
    /// Provisioned video room
    JitsiMeeting,
    ReminderSent,
    MeetingTerminated,
}

impl MetaKey {
    pub fn as_key(&self) -> String {
        match self {
            Self::MeetingToken(user_id) => format!("{}{}", MEETING_TOKEN_PREFIX, user_id),
            Self::JitsiMeeting => JITSI_MEETING_KEY.to_string(),
            Self::ReminderSent => REMINDER_SENT_KEY.to_string(),
            Self::MeetingTerminated => MEETING_TERMINATED_KEY.to_string(),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            JITSI_MEETING_KEY => Some(Self::JitsiMeeting),
            REMINDER_SENT_KEY => Some(Self::ReminderSent),
            MEETING_TERMINATED_KEY => Some(Self::MeetingTerminated),
            _ => key
                .strip_prefix(MEETING_TOKEN_PREFIX)
                .and_then(|user_id| user_id.parse::<i64>().ok())
                .map(Self::MeetingToken),
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// One row of the booking meta table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub booking_id: i64,
    pub meta_key: String,
    pub value: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MetaEntry {
    pub fn key(&self) -> Option<MetaKey> {
        MetaKey::parse(&self.meta_key)
    }
}
