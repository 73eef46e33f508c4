//! Graph API client.
//!
//! Direct, single-call HTTP requests against the vendor Graph API,
//! parameterized by an access token (passed as a query parameter) and
//! path identifiers. Responses are returned as raw JSON.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use leadsbox_core::error::IntegrationError;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Thin client for Graph-style vendor endpoints.
#[derive(Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
}

impl GraphClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a custom base URL (useful for tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL with encoded query parameters.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, IntegrationError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| IntegrationError::InvalidPayload(format!("endpoint URL: {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Value, IntegrationError> {
        debug!(path = %url.path(), "Graph GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| IntegrationError::Network(e.to_string()))?;
        Self::into_json(resp).await
    }

    async fn post(&self, url: Url) -> Result<Value, IntegrationError> {
        debug!(path = %url.path(), "Graph POST");
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| IntegrationError::Network(e.to_string()))?;
        Self::into_json(resp).await
    }

    /// Non-2xx responses carry the vendor's error body, propagated
    /// unmodified to the caller.
    async fn into_json(resp: reqwest::Response) -> Result<Value, IntegrationError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        resp.json()
            .await
            .map_err(|e| IntegrationError::InvalidPayload(e.to_string()))
    }

    /// List businesses owned by a token.
    pub async fn businesses(&self, access_token: &str) -> Result<Value, IntegrationError> {
        let url = self.endpoint(
            "me/businesses",
            &[("access_token", access_token), ("fields", "id,name")],
        )?;
        self.get(url).await
    }

    /// List WhatsApp Business Accounts owned by a business.
    pub async fn owned_wabas(
        &self,
        business_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        let url = self.endpoint(
            &format!("{business_id}/owned_whatsapp_business_accounts"),
            &[("access_token", access_token), ("fields", "id,name")],
        )?;
        self.get(url).await
    }

    /// List phone numbers under a WhatsApp Business Account.
    pub async fn phone_numbers(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        let url = self.endpoint(
            &format!("{waba_id}/phone_numbers"),
            &[("access_token", access_token)],
        )?;
        self.get(url).await
    }

    /// Subscribe the app to a WABA's webhooks.
    pub async fn subscribe_webhook(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        let url = self.endpoint(
            &format!("{waba_id}/subscribed_apps"),
            &[("access_token", access_token)],
        )?;
        self.post(url).await
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url() {
        let client = GraphClient::new();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn custom_base_url_strips_trailing_slash() {
        let client = GraphClient::with_base_url("https://graph.test/");
        assert_eq!(client.base_url(), "https://graph.test");
    }

    #[test]
    fn endpoint_encodes_query_params() {
        let client = GraphClient::with_base_url("https://graph.test");
        let url = client
            .endpoint("me/businesses", &[("access_token", "a b+c"), ("fields", "id,name")])
            .unwrap();
        assert_eq!(url.path(), "/me/businesses");
        // The raw token must not appear unencoded
        assert!(!url.as_str().contains("a b+c"));
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "access_token")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(token, "a b+c");
    }

    #[test]
    fn waba_paths_are_built_from_identifiers() {
        let client = GraphClient::with_base_url("https://graph.test");
        let url = client
            .endpoint("1122/owned_whatsapp_business_accounts", &[("access_token", "t")])
            .unwrap();
        assert_eq!(url.path(), "/1122/owned_whatsapp_business_accounts");

        let url = client
            .endpoint("3344/subscribed_apps", &[("access_token", "t")])
            .unwrap();
        assert_eq!(url.path(), "/3344/subscribed_apps");
    }
}
