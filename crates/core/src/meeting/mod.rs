//! Meeting module
//!
//! Video rooms provisioned for bookings, the scheduled window they live in,
//! and the lifecycle status resolved from wall-clock time.

mod room;
mod schedule;
mod status;
mod store;

pub use room::{
    build_meeting_url, room_name, validate_domain, JitsiApi, JitsiConfig, MeetingRoom,
    DEFAULT_JITSI_DOMAIN, DEFAULT_MEETING_LANGUAGE, JAAS_DOMAIN,
};
pub use schedule::MeetingWindow;
pub use status::{resolve, resolve_with_grace, MeetingStatus, DEFAULT_GRACE_PERIOD_SECS};
pub use store::MeetingRoomStore;
