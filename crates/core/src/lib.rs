//! # LeadsBox Core
//!
//! Domain types, traits, and error definitions for the LeadsBox
//! lead-management backend. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping store backends via configuration
//! - Easy testing with in-memory implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod auth;
pub mod connection;
pub mod error;
pub mod lead;
pub mod message;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use auth::{AuthIdentity, Authenticator};
pub use connection::WhatsappConnection;
pub use error::{AuthError, Error, IntegrationError, Result, StoreError, ValidationError};
pub use lead::{Lead, LeadLabel, Provider, TagUpdate, Transaction};
pub use message::InboundMessage;
pub use store::{ConnectionStore, LeadStore};
