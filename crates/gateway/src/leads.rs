//! `/api/leads` — tag updates and lead listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use leadsbox_core::lead::TagUpdate;

use crate::response::{self, Envelope};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_leads))
        .route("/tag", put(update_tag))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTagRequest {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
}

/// Update or assign a tag to a conversation (lead).
async fn update_tag(
    State(state): State<SharedState>,
    Json(req): Json<UpdateTagRequest>,
) -> Envelope {
    // Validation runs before any store access; an invalid request
    // never writes.
    let update = match TagUpdate::from_parts(
        req.conversation_id,
        req.tag,
        req.provider,
        req.provider_id,
    ) {
        Ok(update) => update,
        Err(e) => return response::error(&e.to_string(), StatusCode::BAD_REQUEST),
    };

    match state.leads.upsert_tag(update).await {
        Ok(lead) => response::success(
            json!({ "updatedLead": lead }),
            "Lead tag updated successfully",
            StatusCode::OK,
        ),
        Err(e) => {
            error!(error = %e, "Error updating lead tag");
            response::error("Failed to update lead tag", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Retrieve all leads.
pub(crate) async fn list_leads(State(state): State<SharedState>) -> Envelope {
    match state.leads.list().await {
        Ok(leads) => response::success(
            json!({ "leads": leads }),
            "Leads retrieved successfully",
            StatusCode::OK,
        ),
        Err(e) => {
            error!(error = %e, "Error retrieving leads");
            response::error("Failed to retrieve leads", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
