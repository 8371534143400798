//! Booking module
//!
//! Read-only view of the external booking store: bookings, their meetings,
//! attendees and user accounts, and the membership relation derived from them.

mod directory;
mod file_directory;
mod model;

pub use directory::BookingDirectory;
pub use file_directory::FileBookingDirectory;
pub use model::*;
