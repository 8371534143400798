//! Meeting status resolver

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRACE_PERIOD_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// Before the grace period opens
    Waiting,
    /// Room reachable, meeting not started yet
    Joinable,
    Active,
    Ended,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Joinable => "joinable",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }

    /// Whether the room may be entered
    pub fn is_open(self) -> bool {
        matches!(self, Self::Joinable | Self::Active)
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve with the default 15 minute grace period.
pub fn resolve(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    terminated: bool,
    override_active: bool,
) -> MeetingStatus {
    resolve_with_grace(
        now,
        start,
        end,
        Duration::seconds(DEFAULT_GRACE_PERIOD_SECS),
        terminated,
        override_active,
    )
}

/// Termination beats the override; the override beats the clock.
pub fn resolve_with_grace(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    grace: Duration,
    terminated: bool,
    override_active: bool,
) -> MeetingStatus {
    if terminated {
        return MeetingStatus::Ended;
    }
    if override_active {
        return MeetingStatus::Active;
    }

    let join_at = start - grace;
    if now < join_at {
        MeetingStatus::Waiting
    } else if now < start {
        MeetingStatus::Joinable
    } else if now <= end {
        MeetingStatus::Active
    } else {
        MeetingStatus::Ended
    }
}
