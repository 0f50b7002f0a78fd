//! Event classification: webhook payload in, reconciliation intent out.
//!
//! Pure transformation. Side effects (logging, remote calls) belong to the
//! relay binary; everything here can be exercised with a byte slice and a
//! product table.

use crate::catalog::ProductTable;
use crate::email::Email;
use crate::event::{EventType, WebhookEvent};
use crate::intent::ReconciliationIntent;

/// Classification failures that reject the request outright.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The body is not a parseable event envelope.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// A shared secret is configured and the supplied token does not match.
    #[error("webhook token mismatch")]
    Unauthorized,
    /// The payload carries no usable customer email.
    #[error("payload carries no customer email")]
    MissingEmail,
}

/// Why a classification produced no intent without being an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    /// The product id is not in the catalog and unknown-product processing
    /// is disabled.
    UnknownProduct {
        /// The unrecognized product id (may be empty).
        product_id: String,
    },
}

/// Outcome of classifying one webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The event maps to group/tag deltas to reconcile.
    Actionable(ReconciliationIntent),
    /// Acknowledged, but deliberately produces no intent.
    Suppressed(SuppressReason),
    /// An event type the relay does not act on; acknowledged as-is.
    Ignored {
        /// The raw event string, for logging.
        event: String,
    },
}

/// Switches that shape classification, fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    /// Process events for products the catalog does not know, using the
    /// fallback entry's generic groups and tags.
    pub process_unknown_products: bool,
}

/// Classify one inbound webhook request.
///
/// Checks run in order: envelope parse, shared-token comparison, email
/// extraction, product resolution (with unknown-product suppression), and
/// finally event-type dispatch. The supplied `header_token` takes precedence
/// over a `token` field in the payload body.
///
/// # Errors
///
/// - [`ClassifyError::MalformedPayload`] when the body is not a JSON envelope
/// - [`ClassifyError::Unauthorized`] when `shared_token` is set and no
///   matching token was supplied
/// - [`ClassifyError::MissingEmail`] when no alias field holds a valid email
pub fn classify(
    body: &[u8],
    header_token: Option<&str>,
    shared_token: Option<&str>,
    table: &ProductTable,
    opts: &ClassifyOptions,
) -> Result<Classification, ClassifyError> {
    let event =
        WebhookEvent::from_json(body).map_err(|e| ClassifyError::MalformedPayload(e.to_string()))?;

    if let Some(secret) = shared_token {
        let supplied = header_token.or(event.token.as_deref());
        if supplied != Some(secret) {
            return Err(ClassifyError::Unauthorized);
        }
    }

    let email = event
        .email
        .as_deref()
        .and_then(|raw| Email::parse(raw).ok())
        .ok_or(ClassifyError::MissingEmail)?;

    let config = table.resolve(&event.product_id);
    if config.unknown_fallback && !opts.process_unknown_products {
        return Ok(Classification::Suppressed(SuppressReason::UnknownProduct {
            product_id: event.product_id,
        }));
    }

    let mut intent = ReconciliationIntent::empty(email);
    match event.event_type {
        EventType::OrderApproved => {
            intent.name = event.name;
            intent.groups_to_add.insert(config.group_client.clone());
            intent
                .groups_to_remove
                .insert(config.group_cart_recovery.clone());
            intent.tags_to_add.insert(config.tag_bought.clone());
            intent
                .tags_to_remove
                .insert(config.tag_abandoned_cart.clone());
            intent.tags_to_remove.insert(config.tag_refund.clone());
        }
        EventType::OrderRefunded | EventType::OrderChargeback | EventType::OrderCanceled => {
            intent.groups_to_remove.insert(config.group_client.clone());
            intent.tags_to_add.insert(config.tag_refund.clone());
        }
        EventType::CheckoutAbandoned => {
            intent
                .groups_to_add
                .insert(config.group_cart_recovery.clone());
            intent
                .tags_to_add
                .insert(config.tag_abandoned_cart.clone());
            intent.guard_group = Some(config.group_client.clone());
        }
        EventType::Unknown => {
            return Ok(Classification::Ignored { event: event.event });
        }
    }

    Ok(Classification::Actionable(intent))
}
