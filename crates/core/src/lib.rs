//! Kiwi Relay Core - Domain logic for the webhook relay.
//!
//! This crate holds everything about the relay that can be computed without
//! touching the network: the product catalog, webhook envelope parsing,
//! event classification, and mutation planning. The `relay` binary wires
//! these pieces to an HTTP server and the MailerLite API.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no logging. This keeps it lightweight and trivially testable.
//!
//! # Modules
//!
//! - [`email`] - Validated, normalized email address newtype
//! - [`catalog`] - Product configurations and the product table
//! - [`event`] - Inbound webhook envelope and event-type parsing
//! - [`classifier`] - Event -> reconciliation intent classification
//! - [`intent`] - Reconciliation intents and mutation-step planning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod classifier;
pub mod email;
pub mod event;
pub mod intent;

pub use catalog::{CatalogError, ProductConfig, ProductTable};
pub use classifier::{
    Classification, ClassifyError, ClassifyOptions, SuppressReason, classify,
};
pub use email::{Email, EmailError};
pub use event::{EventType, WebhookEvent};
pub use intent::{MutationStep, ReconciliationIntent, plan};
