//! Uniform response envelope.
//!
//! Every JSON endpoint answers with
//! `{ success, message, data?, error? }` plus an HTTP status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::error as log_error;

use leadsbox_core::error::IntegrationError;

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type Envelope = (StatusCode, Json<ApiResponse>);

/// A successful envelope with a payload.
pub fn success(data: Value, message: &str, status: StatusCode) -> Envelope {
    (
        status,
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }),
    )
}

/// A failure envelope. The message doubles as the error marker; any
/// sensitive detail belongs in the logs, not here.
pub fn error(message: &str, status: StatusCode) -> Envelope {
    (
        status,
        Json(ApiResponse {
            success: false,
            message: message.into(),
            data: None,
            error: Some(message.into()),
        }),
    )
}

/// Vendor failures are forwarded unmodified: the vendor's status code
/// and body become the response. Transport errors get the envelope.
pub fn upstream_error(err: IntegrationError) -> Response {
    match err {
        IntegrationError::Api { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
        other => {
            log_error!(error = %other, "Vendor API call failed");
            error("Upstream request failed", StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}
