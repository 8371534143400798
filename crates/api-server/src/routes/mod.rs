//! Route handlers

pub mod health;
pub mod join;
pub mod meeting_link;
pub mod meeting_page;

use axum::http::{header, HeaderMap, StatusCode};
use meetgate_core::access::{AccessError, ErrorClass, RequestContext};

use crate::state::AppState;

pub fn status_for(err: &AccessError) -> StatusCode {
    match err.class() {
        ErrorClass::Input => StatusCode::BAD_REQUEST,
        ErrorClass::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorClass::Authorization => StatusCode::FORBIDDEN,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Storage | ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Clock, site identity and user agent fingerprint of a request
pub fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    state.access().context(state.now(), user_agent)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .merge(health::router())
        .merge(meeting_page::router())
        .merge(join::router())
        .merge(meeting_link::router())
}
