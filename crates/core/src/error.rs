//! Error types for the LeadsBox domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all LeadsBox operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation errors ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Authentication errors ---
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Vendor API errors ---
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A request field failed validation. Always maps to 400 Bad Request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown lead label: {0}")]
    UnknownLabel(String),
}

/// An authentication strategy failed to resolve an identity.
/// Surfaced as a redirect with an error marker, never a JSON envelope.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No identity resolved from callback")]
    NoIdentity,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Profile lookup failed: {0}")]
    ProfileFailed(String),

    #[error("Authentication strategy not configured: {0}")]
    NotConfigured(String),
}

/// The persistent store failed. Maps to 500 with a generic message;
/// the detail is for logging only.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// A vendor Graph-style API call failed. Propagated to the caller
/// unmodified — no local normalization, no retries.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Vendor API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_field_name() {
        let err = Error::Validation(ValidationError::MissingField("conversationId"));
        assert!(err.to_string().contains("conversationId"));
    }

    #[test]
    fn integration_error_carries_status_and_body() {
        let err = Error::Integration(IntegrationError::Api {
            status: 400,
            body: "(#100) Unsupported get request".into(),
        });
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Unsupported get request"));
    }

    #[test]
    fn store_error_displays_detail() {
        let err = Error::Store(StoreError::QueryFailed("no such table: leads".into()));
        assert!(err.to_string().contains("no such table"));
    }
}
