//! `/api/auth` — social login flows.
//!
//! Authentication failures never produce a JSON envelope: the client
//! is redirected back to the frontend with an error query parameter.

use axum::extract::{Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use url::Url;

use crate::response::{self, Envelope};
use crate::session;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/facebook", get(facebook_login))
        .route("/facebook/callback", get(facebook_callback))
        .route("/me", get(session_user))
}

/// Send the client to the Facebook OAuth dialog.
async fn facebook_login(State(state): State<SharedState>) -> Redirect {
    Redirect::temporary(&state.facebook_login_url)
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn client_redirect(client_url: &str, path: &str, param: (&str, &str)) -> Redirect {
    let target = match Url::parse(client_url) {
        Ok(mut url) => {
            url.set_path(path);
            url.query_pairs_mut().append_pair(param.0, param.1);
            url.to_string()
        }
        // A malformed CLIENT_URL still has to land somewhere useful
        Err(_) => format!("{client_url}{path}?{}={}", param.0, param.1),
    };
    Redirect::temporary(&target)
}

fn login_failed(client_url: &str) -> Redirect {
    client_redirect(client_url, "/login", ("error", "facebook_auth_failed"))
}

/// Handle the OAuth callback: resolve the identity, establish a
/// session, and hand the token to the frontend.
async fn facebook_callback(
    State(state): State<SharedState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let client_url = &state.config.client_url;

    if let Some(err) = query.error {
        info!(error = %err, "Facebook callback returned an error");
        return login_failed(client_url).into_response();
    }

    let Some(code) = query.code else {
        return login_failed(client_url).into_response();
    };

    let identity = match state.facebook.authenticate(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            error!(error = %e, "Facebook authentication failed");
            return login_failed(client_url).into_response();
        }
    };

    let cookie = state.sessions.issue(&identity.user_id);
    let redirect = client_redirect(client_url, "/facebook", ("token", &identity.token));

    let mut response = redirect.into_response();
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => error!(error = %e, "Session cookie could not be set"),
    }
    response
}

/// Who does the session cookie say is logged in?
async fn session_user(State(state): State<SharedState>, headers: HeaderMap) -> Envelope {
    let user_id = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session::from_cookie_header)
        .and_then(|value| state.sessions.verify(value));

    match user_id {
        Some(user_id) => response::success(
            json!({ "userId": user_id }),
            "Session active",
            StatusCode::OK,
        ),
        None => response::error("Not authenticated", StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_encodes_token() {
        let redirect = client_redirect(
            "http://localhost:3010",
            "/facebook",
            ("token", "EAAG/abc+def=="),
        );
        let response = redirect.into_response();
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("http://localhost:3010/facebook?token="));
        assert!(!location.contains("EAAG/abc+def=="));
    }

    #[test]
    fn failure_redirect_targets_login() {
        let response = login_failed("http://localhost:3010").into_response();
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(
            location,
            "http://localhost:3010/login?error=facebook_auth_failed"
        );
    }
}
