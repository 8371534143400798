//! Booking directory trait
//!
//! Membership is always evaluated against live directory data, never cached.

use async_trait::async_trait;

use super::model::{BookingDetails, User};
use crate::claims::Role;
use crate::Result;

#[async_trait]
pub trait BookingDirectory: Send + Sync {
    /// Booking joined with its meeting, if the booking exists
    async fn booking(&self, booking_id: i64) -> Result<Option<BookingDetails>>;

    /// Owner of the booking's meeting
    async fn host_id(&self, booking_id: i64) -> Result<Option<i64>>;

    /// User ids of the booking's attendees that have an account
    async fn attendee_user_ids(&self, booking_id: i64) -> Result<Vec<i64>>;

    async fn user(&self, user_id: i64) -> Result<Option<User>>;

    async fn confirmed_bookings(&self) -> Result<Vec<BookingDetails>>;

    /// Host-of or attendee-of relation; host wins when a user is both
    async fn membership(&self, booking_id: i64, user_id: i64) -> Result<Option<Role>> {
        if self.host_id(booking_id).await? == Some(user_id) {
            return Ok(Some(Role::Host));
        }
        if self.attendee_user_ids(booking_id).await?.contains(&user_id) {
            return Ok(Some(Role::Attendee));
        }
        Ok(None)
    }
}
