//! Webhook listener.
//!
//! Two routes: the webhook intake and a liveness probe. The intake always
//! answers 200, including for payloads it cannot parse — a non-2xx makes
//! the provider retry-loop the delivery, and a body we cannot read today
//! will not read better on the third attempt. Bad deliveries are logged
//! with their delivery id instead.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use benchci_github::WebhookEvent;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{ingest, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/webhooks", post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let delivery = headers
        .get("x-github-delivery")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let Some(event) = headers
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
    else {
        warn!(delivery, "delivery without an event header ignored");
        return StatusCode::OK;
    };

    match WebhookEvent::parse(event, &body) {
        Ok(parsed) => {
            debug!(delivery, kind = parsed.kind(), "webhook received");
            ingest::handle_event(&state, parsed).await;
        }
        Err(err) => {
            warn!(delivery, event, error = %err, "malformed webhook payload ignored");
        }
    }
    StatusCode::OK
}
