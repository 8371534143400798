//! Stored token definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::Role;

/// Issuance record of one (booking, user) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub user_id: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
