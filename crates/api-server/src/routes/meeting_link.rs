//! `GET /api/hydra-booking/v1/jitsi/meeting-link/{booking_id}`
//!
//! The booking id is the only input; no meeting token is involved.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use meetgate_core::access::MeetingLink;
use serde::Serialize;
use tracing::warn;

use super::{request_context, status_for};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

type RouteError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
struct MeetingLinkResponse {
    status: bool,
    #[serde(flatten)]
    link: MeetingLink,
}

fn route_error(status: StatusCode, code: &str, message: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.into(),
        }),
    )
}

/// Only `^\d+$` matches the route; anything else is an unknown route.
fn parse_booking_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

async fn meeting_link(
    State(state): State<AppState>,
    Path(raw_booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MeetingLinkResponse>, RouteError> {
    let booking_id = parse_booking_id(&raw_booking_id).ok_or_else(|| {
        route_error(
            StatusCode::NOT_FOUND,
            "rest_no_route",
            "No route was found matching the URL and request method.",
        )
    })?;

    let ctx = request_context(&state, &headers);
    let session_user = state.sessions().resolve_user(&headers);

    let link = state
        .access()
        .meeting_link(booking_id, session_user, &ctx)
        .await
        .map_err(|err| {
            warn!(booking_id, code = err.code(), "Meeting link request rejected: {}", err);
            route_error(status_for(&err), err.code(), err.to_string())
        })?;

    Ok(Json(MeetingLinkResponse { status: true, link }))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/hydra-booking/v1/jitsi/meeting-link/{booking_id}",
        get(meeting_link),
    )
}
