//! `GET /meeting/{token}`: the page entry point

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::get,
    Router,
};
use meetgate_core::access::PageView;
use tracing::warn;

use super::{request_context, status_for};
use crate::render;
use crate::state::AppState;

async fn meeting_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Html<String>) {
    let ctx = request_context(&state, &headers);
    let session_user = state.sessions().resolve_user(&headers);

    match state
        .access()
        .open_meeting_page(&token, session_user, &ctx)
        .await
    {
        Ok(PageView::Waiting(page)) => (StatusCode::OK, Html(render::waiting_page(&page))),
        Ok(PageView::Ended(page)) => (StatusCode::OK, Html(render::ended_page(&page))),
        Ok(PageView::Live(page)) => (StatusCode::OK, Html(render::live_page(&page))),
        Err(err) => {
            warn!(code = err.code(), "Meeting page error: {}", err);
            (
                status_for(&err),
                Html(render::error_page(&err, &state.config().site_url)),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meeting/{token}", get(meeting_page))
        .route("/meeting/{token}/", get(meeting_page))
}
