//! Token store backed by the booking meta table
//!
//! Each entry lives under `meeting_token_<user_id>` of its booking.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::model::StoredToken;
use super::repository::TokenStore;
use crate::claims::{Role, MAX_TOKEN_LENGTH};
use crate::meta::{FileMetaStore, MetaKey, MEETING_TOKEN_PREFIX};
use crate::{Error, Result};

#[derive(Clone)]
pub struct MetaTokenStore {
    meta: FileMetaStore,
    ttl: Duration,
}

impl MetaTokenStore {
    pub fn new(meta: FileMetaStore, ttl: Duration) -> Self {
        Self { meta, ttl }
    }
}

#[async_trait]
impl TokenStore for MetaTokenStore {
    async fn put(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredToken> {
        if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::InvalidInput(
                "Invalid token provided for storage".to_string(),
            ));
        }

        let entry = StoredToken {
            token: token.to_string(),
            user_id,
            role,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.meta
            .replace(booking_id, MetaKey::MeetingToken(user_id), &entry, now)
            .await?;
        debug!(booking_id, user_id, "Stored meeting token");
        Ok(entry)
    }

    async fn get(&self, booking_id: i64, user_id: i64) -> Result<Option<StoredToken>> {
        Ok(self
            .meta
            .get_value(booking_id, MetaKey::MeetingToken(user_id))
            .await)
    }

    async fn delete(&self, booking_id: i64, user_id: i64) -> Result<bool> {
        self.meta
            .delete(booking_id, MetaKey::MeetingToken(user_id))
            .await
    }

    async fn delete_all_for_booking(&self, booking_id: i64) -> Result<usize> {
        self.meta
            .delete_prefixed(booking_id, MEETING_TOKEN_PREFIX)
            .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut purged = 0;
        for entry in self.meta.scan_prefixed(MEETING_TOKEN_PREFIX).await {
            let Some(MetaKey::MeetingToken(user_id)) = entry.key() else {
                continue;
            };
            let expired = match serde_json::from_value::<StoredToken>(entry.value) {
                Ok(stored) => stored.is_expired_at(now),
                Err(err) => {
                    warn!(
                        booking_id = entry.booking_id,
                        user_id, "Purging undecodable token row: {}", err
                    );
                    true
                }
            };
            if expired && self.delete(entry.booking_id, user_id).await? {
                purged += 1;
            }
        }
        Ok(purged)
    }
}
