//! Webhook endpoint handler.
//!
//! One handler serves every method and path. Per request it:
//! 1. Rejects non-POST methods (405) and secret mismatches (403) before
//!    reading any body data
//! 2. Accumulates the body, decodes it, and derives the event identity
//!    (failures become 400)
//! 3. Dispatches the event on the hub's five channels
//! 4. Acknowledges with a small JSON body on every path

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::event::{HookEvent, QueryParams};
use crate::hub::HookHub;
use crate::payload;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<HookHub>,
}

impl AppState {
    pub fn new(config: Config, hub: Arc<HookHub>) -> Self {
        Self {
            config: Arc::new(config),
            hub,
        }
    }
}

/// Acknowledgement body sent on every response.
///
/// `message` is the lowercased canonical reason phrase for the status;
/// `result` is `"error"` for any status >= 400 and `"ok"` otherwise.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: String,
    pub result: &'static str,
}

/// Build the single response for an outcome. Written exactly once per
/// request, on every code path.
fn reply(status: StatusCode) -> Response {
    let message = status
        .canonical_reason()
        .unwrap_or("unknown")
        .to_lowercase();
    let result = if status.as_u16() >= 400 { "error" } else { "ok" };

    (status, Json(Ack { message, result })).into_response()
}

/// Accumulate the request body stream into one buffer.
async fn read_body(body: Body) -> Result<Vec<u8>, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }

    Ok(buffer)
}

/// Webhook endpoint. Installed as the router fallback so any path reaches
/// it; only the method matters.
pub async fn webhook(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    info!(
        method = %request.method(),
        path = %request.uri().path(),
        remote = %remote,
        "webhook_request"
    );

    // Header-stage validation: no body is read for rejected requests.
    if request.method() != Method::POST {
        warn!(method = %request.method(), remote = %remote, "webhook_invalid_method");
        return reply(StatusCode::METHOD_NOT_ALLOWED);
    }

    let query = QueryParams::parse(request.uri().query().unwrap_or(""));

    if let Some(secret) = &state.config.secret {
        if query.get("secret") != Some(secret.as_str()) {
            warn!(remote = %remote, "webhook_invalid_secret");
            return reply(StatusCode::FORBIDDEN);
        }
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = match read_body(request.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, remote = %remote, "webhook_body_read_failed");
            return reply(StatusCode::BAD_REQUEST);
        }
    };

    info!(bytes = body.len(), remote = %remote, "webhook_body_received");

    let decoded = match payload::decode(&body, content_type.as_deref()) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, remote = %remote, "webhook_invalid_payload");
            return reply(StatusCode::BAD_REQUEST);
        }
    };

    let event = match HookEvent::from_payload(&decoded) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, remote = %remote, "webhook_incomplete_payload");
            return reply(StatusCode::BAD_REQUEST);
        }
    };

    info!(
        event = %event.kind,
        repo = %event.repo,
        git_ref = %event.ref_segment(),
        remote = %remote,
        has_query = !query.is_empty(),
        "webhook_event"
    );

    state.hub.dispatch(&event, &decoded, &query);

    reply(StatusCode::OK)
}
