//! Message classification — maps free-text message content to one
//! sales-pipeline label via an ordered keyword rule table.
//!
//! The rules overlap on purpose (e.g. "confirmed" appears in both
//! success and in-progress language), so evaluation order is part of
//! the contract: the first rule with any substring match wins, and the
//! fallback is [`LeadLabel::NotALead`]. Pure function of the input
//! text — no I/O, no error conditions.

use leadsbox_core::LeadLabel;

/// One classification rule: a label and the keyword set that selects it.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub label: LeadLabel,
    pub keywords: &'static [&'static str],
}

/// The rule table, in strict priority order. Exposed so tests can
/// assert the ordering directly.
pub const RULES: &[Rule] = &[
    Rule {
        label: LeadLabel::ClosedLostTransaction,
        keywords: &[
            "cancel",
            "not interested",
            "lost",
            "give up",
            "not going ahead",
            "abandon",
        ],
    },
    Rule {
        label: LeadLabel::TransactionSuccessful,
        keywords: &[
            "paid",
            "completed",
            "successful",
            "received",
            "done",
            "confirmed",
        ],
    },
    Rule {
        label: LeadLabel::PaymentPending,
        keywords: &[
            "payment",
            "transfer",
            "awaiting payment",
            "waiting for payment",
            "pending payment",
        ],
    },
    Rule {
        label: LeadLabel::TransactionInProgress,
        keywords: &["order", "purchase", "confirm", "processing", "shipping"],
    },
    Rule {
        label: LeadLabel::FollowUpRequired,
        keywords: &[
            "follow-up",
            "reminder",
            "call me",
            "schedule",
            "check back",
            "ping me",
        ],
    },
    Rule {
        label: LeadLabel::NewInquiry,
        keywords: &[
            "inquiry",
            "question",
            "info",
            "enquiry",
            "how much",
            "what is the price",
        ],
    },
    Rule {
        label: LeadLabel::DemoRequest,
        keywords: &["demo", "show me", "walkthrough"],
    },
    Rule {
        label: LeadLabel::TechnicalSupport,
        keywords: &["technical", "bug", "issue", "problem", "support", "help"],
    },
    Rule {
        label: LeadLabel::PricingInquiry,
        keywords: &["price", "cost", "pricing", "quote"],
    },
    Rule {
        label: LeadLabel::PartnershipOpportunity,
        keywords: &["partnership", "partner", "collaborate", "business opportunity"],
    },
    Rule {
        label: LeadLabel::Feedback,
        keywords: &["feedback", "suggestion", "recommend", "review"],
    },
    Rule {
        label: LeadLabel::Engaged,
        keywords: &["engaged", "interested", "discuss", "talking"],
    },
    Rule {
        label: LeadLabel::NotALead,
        keywords: &["not a lead", "spam", "unsubscribe", "wrong number"],
    },
];

/// Classify a raw message into exactly one pipeline label.
///
/// Matching is case-insensitive substring containment. Every input,
/// including the empty string, returns a label.
pub fn classify(message: &str) -> LeadLabel {
    let lower = message.to_lowercase();

    for rule in RULES {
        if rule.keywords.iter().any(|kw| lower.contains(kw)) {
            return rule.label;
        }
    }

    LeadLabel::NotALead
}
