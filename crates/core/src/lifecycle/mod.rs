//! Lifecycle module
//!
//! What happens around a meeting outside of requests: room provisioning on
//! confirmation, scheduled reminder/terminate/cleanup tasks and the periodic
//! sweeps that back them up.

mod notifier;
mod scheduler;
mod service;

pub use notifier::{LogNotifier, Reminder, ReminderNotifier};
pub use scheduler::{ScheduledTask, TaskKind, TaskQueue};
pub use service::MeetingLifecycle;
