//! Same-origin join endpoint and the dashboard nonce it expects
//!
//! Results always come back as 200 with a `success` envelope.

use axum::{
    extract::{rejection::FormRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Form, Json, Router,
};
use meetgate_core::access::{AccessError, JoinGrant};
use meetgate_core::nonce::DASHBOARD_NONCE_ACTION;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::request_context;
use crate::state::AppState;

pub const JOIN_ACTION: &str = "hbc_join_jitsi_meeting";

#[derive(Debug, Deserialize)]
struct JoinForm {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    booking_id: Option<String>,
    #[serde(default)]
    nonce: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorData {
    message: String,
    code: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum JoinData {
    Granted(JoinGrant),
    Failed(ErrorData),
}

#[derive(Debug, Serialize)]
struct JoinResponse {
    success: bool,
    data: JoinData,
}

impl JoinResponse {
    fn failed(message: impl Into<String>, code: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: JoinData::Failed(ErrorData {
                message: message.into(),
                code: code.into(),
            }),
        })
    }
}

impl From<AccessError> for JoinResponse {
    fn from(err: AccessError) -> Self {
        Self {
            success: false,
            data: JoinData::Failed(ErrorData {
                message: err.to_string(),
                code: err.code().to_string(),
            }),
        }
    }
}

/// Lenient integer read; anything unparseable becomes 0
fn parse_booking_id(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

async fn join_meeting(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<JoinForm>, FormRejection>,
) -> Json<JoinResponse> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!("Unreadable join request: {}", rejection);
            return JoinResponse::failed("Invalid request.", "invalid_request");
        }
    };
    if form.action.as_deref() != Some(JOIN_ACTION) {
        return JoinResponse::failed("Unknown action.", "invalid_action");
    }

    let ctx = request_context(&state, &headers);
    let session_user = state.sessions().resolve_user(&headers);
    let booking_id = parse_booking_id(form.booking_id.as_deref());
    let nonce = form.nonce.unwrap_or_default();

    match state
        .access()
        .join_meeting(booking_id, &nonce, session_user, &ctx)
        .await
    {
        Ok(grant) => Json(JoinResponse {
            success: true,
            data: JoinData::Granted(grant),
        }),
        Err(err) => {
            warn!(booking_id, code = err.code(), "Join request rejected: {}", err);
            Json(err.into())
        }
    }
}

#[derive(Debug, Serialize)]
struct NonceResponse {
    action: &'static str,
    nonce: String,
}

async fn dashboard_nonce(State(state): State<AppState>, headers: HeaderMap) -> Json<NonceResponse> {
    let user_id = state.sessions().resolve_user(&headers).unwrap_or(0);
    Json(NonceResponse {
        action: DASHBOARD_NONCE_ACTION,
        nonce: state.access().dashboard_nonce(user_id, state.now()),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ajax/join-meeting", post(join_meeting))
        .route("/ajax/dashboard-nonce", get(dashboard_nonce))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_support::{
        at, build_state, session_for, ATTENDEE_ID, BOOKING_ID, OUTSIDER_ID, SITE,
    };

    async fn fetch_nonce(app: Router, session: &str) -> String {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ajax/dashboard-nonce")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["action"], DASHBOARD_NONCE_ACTION);
        payload["nonce"].as_str().unwrap().to_string()
    }

    async fn post_join(app: Router, session: Option<&str>, form: &str) -> Value {
        let mut request = Request::builder()
            .method("POST")
            .uri("/ajax/join-meeting")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(session) = session {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", session));
        }
        let response = app
            .oneshot(request.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn member_gets_a_reusable_meeting_url() {
        let (state, _tmp) = build_state(at(9, 0)).await;
        let app = router().with_state(state.clone());
        let session = session_for(&state, ATTENDEE_ID);
        let nonce = fetch_nonce(app.clone(), &session).await;
        let form = format!("action={}&booking_id={}&nonce={}", JOIN_ACTION, BOOKING_ID, nonce);

        let first = post_join(app.clone(), Some(&session), &form).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["data"]["role"], "attendee");
        assert_eq!(first["data"]["booking_id"], BOOKING_ID);
        let url = first["data"]["meeting_url"].as_str().unwrap();
        assert!(url.starts_with(&format!("{}/meeting/", SITE)));
        assert!(first["data"]["room_name"]
            .as_str()
            .unwrap()
            .starts_with("meeting-100-"));

        let second = post_join(app, Some(&session), &form).await;
        assert_eq!(second["data"]["meeting_url"], url);
    }

    #[tokio::test]
    async fn failures_use_the_error_envelope() {
        let (state, _tmp) = build_state(at(9, 0)).await;
        let app = router().with_state(state.clone());
        let session = session_for(&state, ATTENDEE_ID);
        let nonce = fetch_nonce(app.clone(), &session).await;

        let payload = post_join(
            app.clone(),
            Some(&session),
            &format!("action={}&booking_id={}&nonce=wrong", JOIN_ACTION, BOOKING_ID),
        )
        .await;
        assert_eq!(payload["success"], false);
        assert_eq!(payload["data"]["code"], "nonce_failed");

        let payload = post_join(
            app.clone(),
            Some(&session),
            &format!("action={}&booking_id=abc&nonce={}", JOIN_ACTION, nonce),
        )
        .await;
        assert_eq!(payload["data"]["code"], "invalid_booking_id");

        let payload = post_join(app.clone(), Some(&session), "action=other").await;
        assert_eq!(payload["data"]["code"], "invalid_action");

        let outsider = session_for(&state, OUTSIDER_ID);
        let outsider_nonce = fetch_nonce(app.clone(), &outsider).await;
        let payload = post_join(
            app,
            Some(&outsider),
            &format!("action={}&booking_id={}&nonce={}", JOIN_ACTION, BOOKING_ID, outsider_nonce),
        )
        .await;
        assert_eq!(payload["data"]["code"], "access_denied");
        assert!(payload["data"]["message"].is_string());
    }

    #[tokio::test]
    async fn non_form_bodies_use_the_error_envelope() {
        let (state, _tmp) = build_state(at(9, 0)).await;
        let app = router().with_state(state.clone());
        let session = session_for(&state, ATTENDEE_ID);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ajax/join-meeting")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session))
                    .body(Body::from(format!(r#"{{"action":"{}"}}"#, JOIN_ACTION)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["data"]["code"], "invalid_request");
    }

    #[test]
    fn booking_ids_parse_leniently() {
        assert_eq!(parse_booking_id(Some(" 42 ")), 42);
        assert_eq!(parse_booking_id(Some("4x")), 0);
        assert_eq!(parse_booking_id(None), 0);
    }
}
