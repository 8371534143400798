//! Token module
//!
//! Durable record of the token issued to each (booking, user) pair.

mod meta_store;
mod model;
mod repository;

pub use meta_store::MetaTokenStore;
pub use model::StoredToken;
pub use repository::TokenStore;
