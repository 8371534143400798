//! Token store trait
//!
//! Defines the interface for token persistence. Storage errors are always
//! reported to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::StoredToken;
use crate::claims::Role;
use crate::Result;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Upsert the entry for (booking_id, user_id), replacing any prior one.
    /// `created_at = now`, `expires_at = now + ttl`.
    async fn put(
        &self,
        booking_id: i64,
        user_id: i64,
        role: Role,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredToken>;

    async fn get(&self, booking_id: i64, user_id: i64) -> Result<Option<StoredToken>>;

    /// Remove one entry; `false` if it was already gone
    async fn delete(&self, booking_id: i64, user_id: i64) -> Result<bool>;

    /// Remove every entry of a booking
    async fn delete_all_for_booking(&self, booking_id: i64) -> Result<usize>;

    /// Remove every entry that expired at or before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
