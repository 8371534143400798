//! Core library for meetgate
//!
//! Secure meeting access for confirmed bookings:
//! - Claims tokens (encode, decode, validate)
//! - Per-booking token and room persistence
//! - Meeting status resolution over the scheduled window
//! - Access orchestration and the meeting lifecycle

pub mod access;
pub mod booking;
pub mod claims;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod lifecycle;
pub mod meeting;
pub mod meta;
pub mod nonce;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AccessConfig;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
