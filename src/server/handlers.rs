//! Route handlers. Every tool route runs the guard first and only then reads
//! the body, so a rejected caller gets its guard status whatever it sent. Only
//! guard rejections and unreadable bodies produce non-200 statuses.

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN, RETRY_AFTER};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream;
use http_body_util::LengthLimitError;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

use super::AppState;
use crate::dispatch::ToolInvocation;
use crate::guard::{Admission, GuardRequest, Rejection};
use crate::types::ClientKey;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "tools": state.dispatcher.registry().len(),
    }))
}

pub async fn list_tools(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let admission = match state.guard.authorize(&guard_request(&headers)).await {
        Ok(admission) => admission,
        Err(rejection) => return rejection.into_response(),
    };
    let body = Json(json!({ "tools": state.dispatcher.registry().descriptors() }));
    with_quota(body.into_response(), admission)
}

pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (invocation, admission) = match admit(&state, &headers, body).await {
        Ok(admitted) => admitted,
        Err(response) => return response,
    };
    let result = state.dispatcher.dispatch(invocation).await;
    with_quota((StatusCode::OK, Json(result)).into_response(), admission)
}

pub async fn stream_tool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (invocation, admission) = match admit(&state, &headers, body).await {
        Ok(admitted) => admitted,
        Err(response) => return response,
    };
    let result = state.dispatcher.dispatch(invocation).await;
    let event = Event::default()
        .event("result")
        .json_data(&result)
        .unwrap_or_else(|e| {
            tracing::error!("failed to encode result event: {}", e);
            Event::default()
                .event("result")
                .data(r#"{"content":[{"type":"text","text":"Error: failed to encode result"}]}"#)
        });
    let events = stream::once(async move { Ok::<Event, Infallible>(event) });
    with_quota(Sse::new(events).into_response(), admission)
}

/// Guard the request, then read and parse the invocation body.
async fn admit(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<(ToolInvocation, Admission), Response> {
    let admission = state
        .guard
        .authorize(&guard_request(headers))
        .await
        .map_err(IntoResponse::into_response)?;

    let bytes = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        let too_large = e.into_inner().is::<LengthLimitError>();
        if too_large {
            error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                format!("request body exceeds {} bytes", state.max_body_bytes),
            )
        } else {
            error_response(
                StatusCode::BAD_REQUEST,
                "malformed_request",
                "failed to read request body".to_string(),
            )
        }
    })?;

    let invocation: ToolInvocation = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!("malformed invocation body: {}", e);
        error_response(
            StatusCode::BAD_REQUEST,
            "malformed_request",
            format!("invalid invocation payload: {}", e),
        )
    })?;
    Ok((invocation, admission))
}

fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(json!({ "error": { "kind": kind, "message": message } })),
    )
        .into_response()
}

/// Pull the guard-relevant facts out of the headers.
pub fn guard_request(headers: &HeaderMap) -> GuardRequest {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    GuardRequest {
        secure_transport: header(FORWARDED_PROTO_HEADER)
            .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
            .unwrap_or(false),
        api_key: header(API_KEY_HEADER).map(str::to_string),
        client_key: ClientKey::from_forwarded_for(header(FORWARDED_FOR_HEADER)),
        origin: headers
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

fn with_quota(mut response: Response, admission: Admission) -> Response {
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(admission.limit));
    headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(admission.remaining));
    response
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = error_response(self.status(), self.kind(), self.to_string());
        if let Rejection::RateLimited {
            limit,
            retry_after_secs,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(limit));
            headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(0u32));
        }
        response
    }
}
