use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use skpush_core::{Notification, PushSubscription, SubscriberRecord};
use skpush_notifications::{ConnectionState, NotificationError, ResolveError, resolve};
use tracing::debug;

use crate::state::AppState;

/// Fixed phrase carried in each failure response body.
fn failure_phrase(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not found",
        StatusCode::SERVICE_UNAVAILABLE => "service unavailable (try again later)",
        _ => "internal server error",
    }
}

fn failure(status: StatusCode) -> Response {
    let phrase = failure_phrase(status);
    debug!(status = %status.as_u16(), phrase, "request failed");
    (status, phrase).into_response()
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub connection: &'static str,
    pub services: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// GET /status — configured channels plus a live mail connectivity
/// probe when the mail channel exists.
pub async fn status(State(state): State<AppState>) -> Response {
    let Some(engine) = &state.engine else {
        return Json(StatusResponse {
            connection: "unknown",
            services: Vec::new(),
            reason: None,
        })
        .into_response();
    };

    let services = engine.services();
    let response = match engine.verify_mail().await {
        Some(Ok(())) => StatusResponse {
            connection: "up",
            services,
            reason: None,
        },
        Some(Err(e)) => StatusResponse {
            connection: "down",
            services,
            reason: Some(e.to_string()),
        },
        None => StatusResponse {
            connection: connection_label(*engine.connection().borrow()),
            services,
            reason: None,
        },
    };
    Json(response).into_response()
}

fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Up => "up",
        ConnectionState::Down => "down",
        ConnectionState::Unknown => "unknown",
    }
}

/// GET /keys — the watch list resolved live, remote entries expanded.
pub async fn keys(State(state): State<AppState>) -> Response {
    match resolve(&state.config.paths, state.expander.as_ref()).await {
        Ok(resolved) => {
            let paths: Vec<String> = resolved.watch.into_iter().collect();
            Json(paths).into_response()
        }
        Err(ResolveError::Unauthorized { .. }) => failure(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /subscribe/{id} — store a subscriber record. A push-shaped id
/// requires a web-push subscription body; a mail-shaped id stores an
/// empty record under the address.
pub async fn subscribe(
    Path(subscriber_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    if subscriber_id.is_empty() || !body.is_object() {
        return failure(StatusCode::BAD_REQUEST);
    }

    let record = if subscriber_id.contains('@') {
        SubscriberRecord::default()
    } else {
        match serde_json::from_value::<PushSubscription>(body) {
            Ok(subscription) => SubscriberRecord::for_push(subscription),
            Err(_) => return failure(StatusCode::BAD_REQUEST),
        }
    };

    match state.store.set(&subscriber_id, &record).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => failure(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// DELETE /unsubscribe/{id}
pub async fn unsubscribe(
    Path(subscriber_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if subscriber_id.is_empty() {
        return failure(StatusCode::BAD_REQUEST);
    }
    match state.store.delete(&subscriber_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => failure(StatusCode::NOT_FOUND),
    }
}

/// GET /vapid — public VAPID material for browser subscription.
pub async fn vapid(State(state): State<AppState>) -> Response {
    let Some(webpush) = &state.config.services.webpush else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR);
    };
    match &webpush.vapid {
        Some(vapid) if !vapid.public_key.is_empty() && !vapid.subject.is_empty() => Json(json!({
            "publicKey": vapid.public_key,
            "subject": vapid.subject,
        }))
        .into_response(),
        _ => failure(StatusCode::NOT_FOUND),
    }
}

/// PATCH /push/{id} — targeted test delivery to a single subscriber.
pub async fn push(
    Path(subscriber_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let valid = body.get("state").is_some()
        && body.get("method").is_some()
        && body.get("message").is_some();
    if !valid {
        return failure(StatusCode::BAD_REQUEST);
    }
    let Ok(notification) = serde_json::from_value::<Notification>(body) else {
        return failure(StatusCode::BAD_REQUEST);
    };

    let Some(engine) = &state.engine else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR);
    };
    match engine.send_to_subscriber(&subscriber_id, &notification).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(NotificationError::SubscriberNotFound(_)) => failure(StatusCode::NOT_FOUND),
        Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_phrases_are_fixed() {
        assert_eq!(failure_phrase(StatusCode::BAD_REQUEST), "bad request");
        assert_eq!(failure_phrase(StatusCode::FORBIDDEN), "forbidden");
        assert_eq!(failure_phrase(StatusCode::NOT_FOUND), "not found");
        assert_eq!(
            failure_phrase(StatusCode::SERVICE_UNAVAILABLE),
            "service unavailable (try again later)"
        );
        assert_eq!(
            failure_phrase(StatusCode::INTERNAL_SERVER_ERROR),
            "internal server error"
        );
    }
}
