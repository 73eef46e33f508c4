//! Facebook OAuth authentication strategy.
//!
//! Exchanges the OAuth callback code for an access token, then
//! resolves the user profile via `/me`. Implements the core
//! [`Authenticator`] trait so route configuration picks the strategy.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use leadsbox_core::auth::{AuthIdentity, Authenticator};
use leadsbox_core::error::AuthError;
use leadsbox_core::lead::Provider;

use crate::graph::DEFAULT_BASE_URL;

const DIALOG_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Facebook OAuth strategy.
pub struct FacebookAuthenticator {
    http: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
}

impl FacebookAuthenticator {
    pub fn new(app_id: String, app_secret: String, redirect_uri: String) -> Self {
        Self::with_base_url(app_id, app_secret, redirect_uri, DEFAULT_BASE_URL)
    }

    /// Point the strategy at a custom Graph base URL (useful for tests).
    pub fn with_base_url(
        app_id: String,
        app_secret: String,
        redirect_uri: String,
        base_url: &str,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            app_secret,
            redirect_uri,
        }
    }

    /// The OAuth dialog URL the client is sent to for login.
    pub fn login_url(&self) -> String {
        let mut url = Url::parse(DIALOG_URL).expect("static dialog URL");
        url.query_pairs_mut()
            .append_pair("client_id", &self.app_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", "email,public_profile");
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let mut url = Url::parse(&format!("{}/oauth/access_token", self.base_url))
            .map_err(|e| AuthError::ExchangeFailed(format!("token URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.app_id)
            .append_pair("client_secret", &self.app_secret)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("code", code);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(body));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileResponse, AuthError> {
        let mut url = Url::parse(&format!("{}/me", self.base_url))
            .map_err(|e| AuthError::ProfileFailed(format!("profile URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("fields", "id,name,email")
            .append_pair("access_token", access_token);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ProfileFailed(body));
        }

        resp.json()
            .await
            .map_err(|e| AuthError::ProfileFailed(e.to_string()))
    }
}

#[async_trait]
impl Authenticator for FacebookAuthenticator {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    async fn authenticate(&self, code: &str) -> Result<AuthIdentity, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::NoIdentity);
        }

        let token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&token).await?;
        debug!(user_id = %profile.id, "Facebook identity resolved");

        Ok(AuthIdentity {
            user_id: profile.id,
            token,
            name: profile.name,
            email: profile.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> FacebookAuthenticator {
        FacebookAuthenticator::with_base_url(
            "123456".into(),
            "app-secret".into(),
            "https://api.example.com/api/auth/facebook/callback".into(),
            "https://graph.test",
        )
    }

    #[test]
    fn provider_is_facebook() {
        assert_eq!(strategy().provider(), Provider::Facebook);
    }

    #[test]
    fn login_url_carries_client_and_redirect() {
        let url = strategy().login_url();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("www.facebook.com"));

        let client_id = parsed
            .query_pairs()
            .find(|(k, _)| k == "client_id")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(client_id, "123456");

        // redirect_uri must be percent-encoded in the dialog URL
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapi.example.com"));
    }

    #[tokio::test]
    async fn empty_code_yields_no_identity() {
        let err = strategy().authenticate("  ").await.unwrap_err();
        assert!(matches!(err, AuthError::NoIdentity));
    }

    #[test]
    fn token_response_deserializes() {
        let json = r#"{"access_token": "EAAG123", "token_type": "bearer", "expires_in": 5183944}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "EAAG123");
    }

    #[test]
    fn profile_tolerates_missing_email() {
        let json = r#"{"id": "10223", "name": "Ada Lovelace"}"#;
        let resp: ProfileResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, "10223");
        assert!(resp.email.is_none());
    }
}
