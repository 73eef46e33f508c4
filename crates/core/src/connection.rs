//! WhatsApp connection record — a linked business phone number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A linked WhatsApp business phone number.
///
/// At most one record exists per (user, WABA, phone-number) triple —
/// the store enforces this via upsert. `access_token` is the mutable
/// field on refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsappConnection {
    /// Owning user, when the connection was made by a logged-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// WhatsApp Business Account identifier.
    pub waba_id: String,

    /// Phone number identifier under the WABA.
    pub phone_number_id: String,

    /// Vendor access token for this connection.
    pub access_token: String,

    pub updated_at: DateTime<Utc>,
}

impl WhatsappConnection {
    pub fn new(
        user_id: Option<String>,
        waba_id: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            waba_id: waba_id.into(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
            updated_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for WhatsappConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsappConnection")
            .field("user_id", &self.user_id)
            .field("waba_id", &self.waba_id)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
