use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::services::engine::{EngineAction, EngineReply};
use crate::services::flows::staff_display;
use crate::state::AppState;

const FAQ_FALLBACK_REPLY: &str =
    "I'm not sure about that one — a member of our staff will get back to you shortly.";

#[derive(Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
}

#[derive(Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

fn validate_line_signature(channel_secret: &str, signature: &str, body: &[u8]) -> bool {
    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    expected == signature
}

pub async fn line_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    // Validate the platform signature (skip if secret is empty, dev mode).
    if !state.config.line_channel_secret.is_empty() {
        let signature = headers
            .get("x-line-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if signature.is_empty()
            || !validate_line_signature(&state.config.line_channel_secret, signature, &body)
        {
            tracing::warn!("missing or invalid webhook signature");
            return Err(AppError::InvalidSignature);
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))?;

    for event in payload.events {
        handle_event(&state, event).await;
    }

    Ok("OK".into_response())
}

async fn handle_event(state: &Arc<AppState>, event: WebhookEvent) {
    if event.kind != "message" {
        return;
    }
    let Some(user_id) = event.source.and_then(|s| s.user_id) else {
        return;
    };
    let Some(message) = event.message else {
        return;
    };
    if message.kind != "text" {
        return;
    }
    let Some(text) = message.text else {
        return;
    };

    tracing::info!(user = %user_id, body = %text, "incoming message");

    let reply = match state.engine.handle(&user_id, &text).await {
        Some(reply) => reply,
        // Not booking-related: hand off with the FAQ fallback.
        None => EngineReply {
            text: FAQ_FALLBACK_REPLY.to_string(),
            action: None,
        },
    };

    let delivery = match event.reply_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => state.messaging.reply_message(token, &reply.text).await,
        None => state.messaging.push_message(&user_id, &reply.text).await,
    };
    if let Err(e) = delivery {
        tracing::error!(error = %e, user = %user_id, "failed to deliver reply");
    }

    if let Some(action) = reply.action {
        notify_team(state, &action).await;
    }
}

async fn notify_team(state: &Arc<AppState>, action: &EngineAction) {
    let alert = match action {
        EngineAction::Created(r) => format!(
            "New reservation {}: {} with {} on {} {}~{} for {}",
            r.id,
            r.service,
            staff_display(&r.staff),
            r.date,
            r.start,
            r.end,
            r.customer_name.as_deref().unwrap_or("a customer"),
        ),
        EngineAction::Modified {
            reservation_id,
            changes,
        } => {
            let mut parts = Vec::new();
            if let Some(date) = changes.date {
                parts.push(format!("date changed to {date}"));
            }
            if let (Some(start), Some(end)) = (changes.start, changes.end) {
                parts.push(format!("time changed to {start}~{end}"));
            }
            if let Some(service) = &changes.service {
                parts.push(format!("service changed to {service}"));
            }
            if let Some(staff) = &changes.staff {
                parts.push(format!("staff changed to {}", staff_display(staff)));
            }
            format!("Reservation {reservation_id} updated: {}", parts.join(", "))
        }
        EngineAction::Cancelled { reservation_id } => {
            format!("Reservation {reservation_id} was cancelled")
        }
    };

    if state.config.team_alert_to.is_empty() {
        tracing::warn!("team_alert_to not configured, skipping alert");
    } else if let Err(e) = state
        .messaging
        .push_message(&state.config.team_alert_to, &alert)
        .await
    {
        tracing::error!(error = %e, "failed to send team alert");
    }

    // Ping the assigned staff member directly when they have an address.
    if let EngineAction::Created(r) = action {
        let addr = state
            .profile
            .staff_named(&r.staff)
            .and_then(|s| s.notify_address.clone());
        if let Some(addr) = addr {
            if let Err(e) = state.messaging.push_message(&addr, &alert).await {
                tracing::error!(error = %e, staff = %r.staff, "failed to notify staff");
            }
        }
    }
}
