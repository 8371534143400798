//! Access module
//!
//! Issuance and redemption of meeting tokens. One validator backs every
//! entry point: the meeting page, the same-origin join request and the
//! network API.

mod context;
mod error;
mod issuer;
mod service;
mod validator;

pub use context::RequestContext;
pub use error::{AccessError, ErrorClass};
pub use issuer::{IssuedToken, TokenIssuer};
pub use service::{JoinGrant, MeetingAccess, MeetingLink, MeetingPage, PageView};
pub use validator::{TokenValidator, ValidatedAccess};
