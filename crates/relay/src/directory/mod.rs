//! Directory service abstraction.
//!
//! The reconciler talks to the email-marketing platform through the
//! [`Directory`] trait so it can be driven against a recording fake in
//! tests. The production implementation is [`MailerLiteClient`].

mod mailerlite;

pub use mailerlite::MailerLiteClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the directory service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A remote subscriber record, addressed by email.
///
/// Owned entirely by the remote service; never cached across invocations.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    /// Group memberships, populated only when fetched with groups included.
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A named remote group denoting subscriber segment membership.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
}

/// A named remote label attachable per subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Operations the reconciler needs from the directory service.
///
/// Implementations must be thread-safe; one reconciliation awaits these
/// sequentially, but the server handles many reconciliations concurrently.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a subscriber by email. Absent subscribers are `None`, not an
    /// error.
    async fn find_subscriber(&self, email: &str) -> Result<Option<Subscriber>, DirectoryError>;

    /// Create a subscriber, with the name field populated when provided.
    async fn create_subscriber(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<Subscriber, DirectoryError>;

    /// Resolve a group name to the group record. Exact match; first match
    /// wins; no match is `None`.
    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, DirectoryError>;

    /// Add a subscriber to a group. Idempotent on the remote side.
    async fn assign_to_group(
        &self,
        group_id: &str,
        subscriber_id: &str,
    ) -> Result<(), DirectoryError>;

    /// Remove a subscriber from a group.
    async fn unassign_from_group(
        &self,
        subscriber_id: &str,
        group_id: &str,
    ) -> Result<(), DirectoryError>;

    /// Ensure the named tag exists and attach it to the subscriber.
    async fn attach_tag(&self, name: &str, subscriber_id: &str) -> Result<(), DirectoryError>;

    /// List all tags.
    async fn list_tags(&self) -> Result<Vec<Tag>, DirectoryError>;

    /// Detach a tag from a subscriber.
    async fn detach_tag(&self, tag_id: &str, subscriber_id: &str) -> Result<(), DirectoryError>;

    /// Look up a subscriber by email with group memberships included.
    async fn subscriber_with_groups(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, DirectoryError>;
}
