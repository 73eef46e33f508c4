//! `/api/whatsapp` — business discovery, phone-number listing, webhook
//! subscription, and connection persistence.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::response::{self, upstream_error, Envelope};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/businesses", get(list_businesses))
        .route("/businesses/{id}/wabas", get(list_wabas))
        .route("/wabas/{id}/phone-numbers", get(list_phone_numbers))
        .route("/wabas/{id}/subscribe", post(subscribe_webhook))
        .route("/connections", post(save_connection))
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: String,
}

async fn list_businesses(
    State(state): State<SharedState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match state.whatsapp.businesses(&query.access_token).await {
        Ok(data) => response::success(
            json!({ "businesses": data }),
            "Businesses retrieved successfully",
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn list_wabas(
    State(state): State<SharedState>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match state
        .whatsapp
        .business_accounts(&business_id, &query.access_token)
        .await
    {
        Ok(data) => response::success(
            json!({ "wabas": data }),
            "Business accounts retrieved successfully",
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn list_phone_numbers(
    State(state): State<SharedState>,
    Path(waba_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match state
        .whatsapp
        .phone_numbers(&waba_id, &query.access_token)
        .await
    {
        Ok(data) => response::success(
            json!({ "phoneNumbers": data }),
            "Phone numbers retrieved successfully",
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn subscribe_webhook(
    State(state): State<SharedState>,
    Path(waba_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match state
        .whatsapp
        .register_webhook(&waba_id, &query.access_token)
        .await
    {
        Ok(data) => response::success(
            json!({ "subscription": data }),
            "Webhook registered successfully",
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => upstream_error(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveConnectionRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    waba_id: Option<String>,
    #[serde(default)]
    phone_number_id: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

async fn save_connection(
    State(state): State<SharedState>,
    Json(req): Json<SaveConnectionRequest>,
) -> Envelope {
    let Some(waba_id) = req.waba_id.filter(|v| !v.trim().is_empty()) else {
        return response::error("Missing required field: wabaId", StatusCode::BAD_REQUEST);
    };
    let Some(phone_number_id) = req.phone_number_id.filter(|v| !v.trim().is_empty()) else {
        return response::error(
            "Missing required field: phoneNumberId",
            StatusCode::BAD_REQUEST,
        );
    };
    let Some(access_token) = req.access_token.filter(|v| !v.trim().is_empty()) else {
        return response::error("Missing required field: accessToken", StatusCode::BAD_REQUEST);
    };

    match state
        .whatsapp
        .save_connection(req.user_id, waba_id, phone_number_id, access_token)
        .await
    {
        Ok(connection) => response::success(
            json!({ "connection": connection }),
            "Connection saved successfully",
            StatusCode::OK,
        ),
        Err(e) => {
            error!(error = %e, "Error saving WhatsApp connection");
            response::error("Failed to save connection", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
