//! Authentication strategies — one pluggable implementation per
//! social-login provider, selected by route configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::lead::Provider;

/// The identity an authentication strategy resolves from a callback.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Provider-side user identifier.
    pub user_id: String,

    /// Access token issued for this user.
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl std::fmt::Debug for AuthIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthIdentity")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish()
    }
}

/// A pluggable authentication capability.
///
/// Implementations exchange a provider callback code for an identity.
/// Selection happens by route configuration, not runtime type
/// inspection.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Which provider this strategy authenticates against.
    fn provider(&self) -> Provider;

    /// Exchange an OAuth callback code for a resolved identity.
    async fn authenticate(&self, code: &str) -> Result<AuthIdentity, AuthError>;
}
