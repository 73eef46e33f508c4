//! Lead domain types — a lead is one tracked customer conversation
//! with an append-only history of label assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Which messaging channel a conversation arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Whatsapp,
    Instagram,
    Telegram,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Whatsapp => "whatsapp",
            Provider::Instagram => "instagram",
            Provider::Telegram => "telegram",
            Provider::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Provider::Whatsapp),
            "instagram" => Ok(Provider::Instagram),
            "telegram" => Ok(Provider::Telegram),
            "facebook" => Ok(Provider::Facebook),
            other => Err(ValidationError::UnknownProvider(other.into())),
        }
    }
}

/// The closed set of sales-pipeline labels a conversation can carry.
///
/// Wire format is SCREAMING_SNAKE_CASE, matching what clients send in
/// tag-update requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadLabel {
    NewInquiry,
    PaymentPending,
    TransactionSuccessful,
    TransactionInProgress,
    ClosedLostTransaction,
    FollowUpRequired,
    DemoRequest,
    TechnicalSupport,
    PricingInquiry,
    PartnershipOpportunity,
    Feedback,
    Engaged,
    NotALead,
}

impl LeadLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadLabel::NewInquiry => "NEW_INQUIRY",
            LeadLabel::PaymentPending => "PAYMENT_PENDING",
            LeadLabel::TransactionSuccessful => "TRANSACTION_SUCCESSFUL",
            LeadLabel::TransactionInProgress => "TRANSACTION_IN_PROGRESS",
            LeadLabel::ClosedLostTransaction => "CLOSED_LOST_TRANSACTION",
            LeadLabel::FollowUpRequired => "FOLLOW_UP_REQUIRED",
            LeadLabel::DemoRequest => "DEMO_REQUEST",
            LeadLabel::TechnicalSupport => "TECHNICAL_SUPPORT",
            LeadLabel::PricingInquiry => "PRICING_INQUIRY",
            LeadLabel::PartnershipOpportunity => "PARTNERSHIP_OPPORTUNITY",
            LeadLabel::Feedback => "FEEDBACK",
            LeadLabel::Engaged => "ENGAGED",
            LeadLabel::NotALead => "NOT_A_LEAD",
        }
    }
}

impl fmt::Display for LeadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW_INQUIRY" => Ok(LeadLabel::NewInquiry),
            "PAYMENT_PENDING" => Ok(LeadLabel::PaymentPending),
            "TRANSACTION_SUCCESSFUL" => Ok(LeadLabel::TransactionSuccessful),
            "TRANSACTION_IN_PROGRESS" => Ok(LeadLabel::TransactionInProgress),
            "CLOSED_LOST_TRANSACTION" => Ok(LeadLabel::ClosedLostTransaction),
            "FOLLOW_UP_REQUIRED" => Ok(LeadLabel::FollowUpRequired),
            "DEMO_REQUEST" => Ok(LeadLabel::DemoRequest),
            "TECHNICAL_SUPPORT" => Ok(LeadLabel::TechnicalSupport),
            "PRICING_INQUIRY" => Ok(LeadLabel::PricingInquiry),
            "PARTNERSHIP_OPPORTUNITY" => Ok(LeadLabel::PartnershipOpportunity),
            "FEEDBACK" => Ok(LeadLabel::Feedback),
            "ENGAGED" => Ok(LeadLabel::Engaged),
            "NOT_A_LEAD" => Ok(LeadLabel::NotALead),
            other => Err(ValidationError::UnknownLabel(other.into())),
        }
    }
}

/// One timestamped label assignment appended to a lead's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub tag: LeadLabel,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn now(tag: LeadLabel) -> Self {
        Self {
            tag,
            timestamp: Utc::now(),
        }
    }
}

/// A tracked customer conversation.
///
/// `conversation_id` is the upsert key — one lead per conversation.
/// Transactions are append-only; leads are never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Store-assigned unique ID
    pub id: String,

    /// Conversation identifier (unique per provider scope)
    pub conversation_id: String,

    /// Which channel this conversation lives on
    pub provider: Provider,

    /// Provider-specific identifier (phone number ID, page ID, chat ID)
    pub provider_id: String,

    /// Ordered label assignment history
    #[serde(default)]
    pub transactions: Vec<Transaction>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// The most recently assigned label, if any.
    pub fn current_tag(&self) -> Option<LeadLabel> {
        self.transactions.last().map(|t| t.tag)
    }
}

/// A validated tag-update request — the input to `LeadStore::upsert_tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUpdate {
    pub conversation_id: String,
    pub tag: LeadLabel,
    pub provider: Provider,
    pub provider_id: String,
}

impl TagUpdate {
    /// Build from raw request fields, validating that every field is
    /// present and non-empty and that tag/provider parse. Runs BEFORE
    /// any store call so an invalid request never touches the store.
    pub fn from_parts(
        conversation_id: Option<String>,
        tag: Option<String>,
        provider: Option<String>,
        provider_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let conversation_id = required("conversationId", conversation_id)?;
        let tag = required("tag", tag)?;
        let provider = required("provider", provider)?;
        let provider_id = required("providerId", provider_id)?;

        Ok(Self {
            conversation_id,
            tag: tag.parse()?,
            provider: provider.parse()?,
            provider_id,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(name))?;
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips_through_str() {
        let label: LeadLabel = "CLOSED_LOST_TRANSACTION".parse().unwrap();
        assert_eq!(label, LeadLabel::ClosedLostTransaction);
        assert_eq!(label.as_str(), "CLOSED_LOST_TRANSACTION");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "HOT_LEAD".parse::<LeadLabel>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownLabel("HOT_LEAD".into()));
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!("WhatsApp".parse::<Provider>().unwrap(), Provider::Whatsapp);
        assert_eq!("telegram".parse::<Provider>().unwrap(), Provider::Telegram);
    }

    #[test]
    fn tag_update_requires_conversation_id() {
        let err = TagUpdate::from_parts(
            None,
            Some("ENGAGED".into()),
            Some("whatsapp".into()),
            Some("12345".into()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("conversationId"));
    }

    #[test]
    fn tag_update_rejects_blank_fields() {
        let err = TagUpdate::from_parts(
            Some("  ".into()),
            Some("ENGAGED".into()),
            Some("whatsapp".into()),
            Some("12345".into()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyField("conversationId"));
    }

    #[test]
    fn tag_update_parses_valid_input() {
        let update = TagUpdate::from_parts(
            Some("wa:15551234567".into()),
            Some("NEW_INQUIRY".into()),
            Some("whatsapp".into()),
            Some("109876".into()),
        )
        .unwrap();
        assert_eq!(update.tag, LeadLabel::NewInquiry);
        assert_eq!(update.provider, Provider::Whatsapp);
    }

    #[test]
    fn current_tag_is_last_transaction() {
        let now = Utc::now();
        let lead = Lead {
            id: "1".into(),
            conversation_id: "wa:1".into(),
            provider: Provider::Whatsapp,
            provider_id: "p1".into(),
            transactions: vec![
                Transaction { tag: LeadLabel::NewInquiry, timestamp: now },
                Transaction { tag: LeadLabel::Engaged, timestamp: now },
            ],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(lead.current_tag(), Some(LeadLabel::Engaged));
    }

    #[test]
    fn label_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&LeadLabel::FollowUpRequired).unwrap();
        assert_eq!(json, "\"FOLLOW_UP_REQUIRED\"");
    }
}
