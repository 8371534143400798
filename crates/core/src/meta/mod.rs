//! Booking meta module
//!
//! A schemaless key/value side table scoped by booking id. Tokens, rooms and
//! lifecycle markers all live here under reserved keys.

mod file_store;
mod model;

pub use file_store::FileMetaStore;
pub use model::{MetaEntry, MetaKey, MEETING_TOKEN_PREFIX};
