//! Claims model definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fields a decoded token must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "booking_id",
    "user_id",
    "role",
    "expires",
    "issued_at",
    "site_identity",
];

/// Participant role inside a meeting room.
///
/// Only drives UI affordances; access is decided by live booking membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Attendee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Attendee => "attendee",
        }
    }

    pub fn is_moderator(self) -> bool {
        matches!(self, Self::Host)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Attendee
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "attendee" => Ok(Self::Attendee),
            _ => Err(format!("Unsupported role '{}'", value)),
        }
    }
}

/// Facts a meeting token asserts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub booking_id: i64,
    pub user_id: i64,
    pub role: Role,
    /// Unix seconds
    pub issued_at: i64,
    /// Unix seconds, always `issued_at + ttl`
    pub expires: i64,
    pub site_identity: String,
    /// Keyed hash of the issuing request's user agent. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_fingerprint: Option<String>,
    /// Issued per (booking, user) but not enforced on redemption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_replay_nonce: Option<String>,
}

impl Claims {
    pub fn new(
        booking_id: i64,
        user_id: i64,
        role: Role,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        site_identity: impl Into<String>,
    ) -> Self {
        Self {
            booking_id,
            user_id,
            role,
            issued_at: issued_at.timestamp(),
            expires: (issued_at + ttl).timestamp(),
            site_identity: site_identity.into(),
            client_fingerprint: None,
            anti_replay_nonce: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.client_fingerprint = fingerprint;
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.anti_replay_nonce = Some(nonce.into());
        self
    }

    /// A token is usable strictly before its `expires` second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.expires, 0)
    }
}
