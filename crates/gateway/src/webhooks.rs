//! Inbound channel webhooks — the classify → store ingestion path.
//!
//! Graph-style webhooks (WhatsApp Cloud, Instagram) share the hub
//! verification handshake and the `X-Hub-Signature-256` HMAC scheme;
//! Telegram posts bare updates.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{error, info, warn};

use leadsbox_channels::{instagram, telegram, whatsapp};
use leadsbox_core::error::StoreError;
use leadsbox_core::lead::{Lead, TagUpdate};
use leadsbox_core::InboundMessage;

use crate::response::{self, Envelope};
use crate::SharedState;

type HmacSha256 = Hmac<Sha256>;

pub fn provider_router() -> Router<SharedState> {
    Router::new().route("/webhook", get(verify_webhook).post(provider_webhook))
}

pub fn instagram_router() -> Router<SharedState> {
    Router::new().route("/webhook", get(verify_webhook).post(instagram_webhook))
}

pub fn telegram_router() -> Router<SharedState> {
    Router::new()
        .route("/webhook", post(telegram_webhook))
        .route("/register", post(register_telegram_webhook))
}

// ── Hub verification handshake ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HubQuery {
    #[serde(rename = "hub.mode", default)]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    challenge: Option<String>,
}

/// Echo `hub.challenge` when the verify token matches.
async fn verify_webhook(
    State(state): State<SharedState>,
    Query(query): Query<HubQuery>,
) -> Response {
    let token_matches = query.verify_token.as_deref() == Some(&state.config.webhook.verify_token)
        && !state.config.webhook.verify_token.is_empty();

    if query.mode.as_deref() == Some("subscribe") && token_matches {
        let challenge = query.challenge.unwrap_or_default();
        return (StatusCode::OK, challenge).into_response();
    }

    warn!("Webhook verification failed");
    response::error("Webhook verification failed", StatusCode::UNAUTHORIZED).into_response()
}

// ── Signature validation ────────────────────────────────────────────

/// Validate an `X-Hub-Signature-256` header against the raw body.
///
/// Expected format: `sha256=<hex digest>`. No configured secret means
/// no validation. Constant-time comparison via `verify_slice`.
fn validate_signature(app_secret: &str, payload: &[u8], signature: Option<&str>) -> bool {
    if app_secret.is_empty() {
        return true;
    }
    let Some(signature) = signature else {
        return false;
    };
    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);

    let provided = match hex::decode(sig_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac =
        HmacSha256::new_from_slice(app_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

// ── Ingestion ───────────────────────────────────────────────────────

/// Classify an inbound message and upsert the lead it belongs to.
async fn ingest(state: &SharedState, msg: InboundMessage) -> Result<Lead, StoreError> {
    let tag = leadsbox_classify::classify(&msg.text);
    info!(
        conversation_id = %msg.conversation_id,
        provider = %msg.provider,
        tag = %tag,
        "inbound message classified"
    );

    state
        .leads
        .upsert_tag(TagUpdate {
            conversation_id: msg.conversation_id,
            tag,
            provider: msg.provider,
            provider_id: msg.provider_id,
        })
        .await
}

async fn ingest_all(state: &SharedState, messages: Vec<InboundMessage>) -> Envelope {
    let mut ingested = 0usize;
    for msg in messages {
        match ingest(state, msg).await {
            Ok(_) => ingested += 1,
            Err(e) => {
                error!(error = %e, "Error storing inbound message");
                return response::error(
                    "Failed to process webhook",
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
        }
    }
    response::success(
        json!({ "ingested": ingested }),
        "Webhook processed",
        StatusCode::OK,
    )
}

// ── Handlers ────────────────────────────────────────────────────────

/// WhatsApp Cloud inbound webhook. The signature covers the raw body,
/// so the body is taken as bytes and parsed after validation.
async fn provider_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok());

    if !validate_signature(&state.config.webhook.app_secret, &body, signature) {
        warn!("Webhook signature validation failed");
        return response::error("Invalid webhook signature", StatusCode::UNAUTHORIZED)
            .into_response();
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return response::error(&format!("Malformed payload: {e}"), StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    match whatsapp::parse_webhook(&payload) {
        Ok(messages) => ingest_all(&state, messages).await.into_response(),
        Err(e) => {
            response::error(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
    }
}

async fn instagram_webhook(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Response {
    match instagram::parse_webhook(&payload) {
        Ok(messages) => ingest_all(&state, messages).await.into_response(),
        Err(e) => response::error(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

async fn telegram_webhook(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Response {
    match telegram::parse_update(&payload) {
        Ok(Some(msg)) => ingest_all(&state, vec![msg]).await.into_response(),
        Ok(None) => ingest_all(&state, vec![]).await.into_response(),
        Err(e) => response::error(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct RegisterTelegramRequest {
    url: String,
}

/// Point the Telegram bot's webhook at this deployment.
async fn register_telegram_webhook(
    State(state): State<SharedState>,
    Json(req): Json<RegisterTelegramRequest>,
) -> Response {
    match state.telegram.set_webhook(&req.url).await {
        Ok(data) => response::success(
            json!({ "result": data }),
            "Telegram webhook registered",
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => response::upstream_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_secret_skips_validation() {
        assert!(validate_signature("", b"anything", None));
    }

    #[test]
    fn missing_signature_fails_when_secret_set() {
        assert!(!validate_signature("secret", b"payload", None));
    }

    #[test]
    fn valid_signature_passes() {
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"payload");
        let sig = hex::encode(mac.finalize().into_bytes());

        assert!(validate_signature("secret", b"payload", Some(&format!("sha256={sig}"))));
        // Prefix is optional
        assert!(validate_signature("secret", b"payload", Some(&sig)));
    }

    #[test]
    fn tampered_body_fails() {
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"payload");
        let sig = hex::encode(mac.finalize().into_bytes());

        assert!(!validate_signature("secret", b"other-payload", Some(&format!("sha256={sig}"))));
    }

    #[test]
    fn garbage_hex_fails() {
        assert!(!validate_signature("secret", b"payload", Some("sha256=zzzz")));
    }
}
