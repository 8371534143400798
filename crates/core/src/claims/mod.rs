//! Claims module
//!
//! The claims record carried by a meeting token and its wire codec.

mod codec;
mod model;

pub use codec::{decode, encode, ClaimsError, MAX_TOKEN_LENGTH};
pub use model::{Claims, Role, REQUIRED_FIELDS};
