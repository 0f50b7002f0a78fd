//! Inbound webhook envelope and event-type parsing.
//!
//! Kiwify posts a JSON envelope whose field names drifted across platform
//! versions: the customer email arrives as `data.customer_email` or
//! `data.email`, the name as `data.customer_name` or `data.name`, and the
//! product id as either a JSON string or a number. Parsing flattens all of
//! that into one [`WebhookEvent`] per request; nothing here is persisted.

use core::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Purchase-lifecycle event types the relay acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// A purchase completed and was approved.
    OrderApproved,
    /// A purchase was refunded.
    OrderRefunded,
    /// A purchase was charged back.
    OrderChargeback,
    /// A purchase was canceled.
    OrderCanceled,
    /// A checkout was started but never completed.
    CheckoutAbandoned,
    /// Any event string the relay does not act on.
    Unknown,
}

impl EventType {
    /// Parse an event string, case-insensitively.
    ///
    /// Unrecognized strings map to [`EventType::Unknown`]; the raw string is
    /// kept on the [`WebhookEvent`] for logging.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "order.approved" => Self::OrderApproved,
            "order.refunded" => Self::OrderRefunded,
            "order.chargeback" => Self::OrderChargeback,
            "order.canceled" => Self::OrderCanceled,
            "checkout.abandoned" => Self::CheckoutAbandoned,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OrderApproved => "order.approved",
            Self::OrderRefunded => "order.refunded",
            Self::OrderChargeback => "order.chargeback",
            Self::OrderCanceled => "order.canceled",
            Self::CheckoutAbandoned => "checkout.abandoned",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Raw JSON envelope as Kiwify posts it.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: Option<String>,
    token: Option<String>,
    data: Option<EnvelopeData>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    customer_email: Option<String>,
    email: Option<String>,
    customer_name: Option<String>,
    name: Option<String>,
    product_id: Option<Value>,
    product_name: Option<String>,
}

/// One parsed webhook request. Validated and discarded per request.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Raw event string as received (empty when absent).
    pub event: String,
    /// Parsed event type.
    pub event_type: EventType,
    /// Shared-secret token supplied in the payload body, if any.
    pub token: Option<String>,
    /// Customer email, first of `customer_email` / `email`. Not yet validated.
    pub email: Option<String>,
    /// Customer name, first of `customer_name` / `name`.
    pub name: Option<String>,
    /// Product identifier, stringified; empty when absent.
    pub product_id: String,
    /// Product name as reported by the payment platform.
    pub product_name: Option<String>,
}

impl WebhookEvent {
    /// Parse a webhook request body.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the body is not a JSON
    /// object of the expected envelope shape.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        let data = envelope.data.unwrap_or_default();

        let event = envelope.event.unwrap_or_default();
        let event_type = EventType::parse(&event);

        Ok(Self {
            event,
            event_type,
            token: envelope.token,
            email: data.customer_email.or(data.email),
            name: data.customer_name.or(data.name),
            product_id: data.product_id.as_ref().map(stringify_id).unwrap_or_default(),
            product_name: data.product_name,
        })
    }
}

/// Stringify a product id that may arrive as a JSON string or number.
fn stringify_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse("order.approved"), EventType::OrderApproved);
        assert_eq!(EventType::parse("order.refunded"), EventType::OrderRefunded);
        assert_eq!(
            EventType::parse("order.chargeback"),
            EventType::OrderChargeback
        );
        assert_eq!(EventType::parse("order.canceled"), EventType::OrderCanceled);
        assert_eq!(
            EventType::parse("checkout.abandoned"),
            EventType::CheckoutAbandoned
        );
        assert_eq!(EventType::parse("subscription.renewed"), EventType::Unknown);
        assert_eq!(EventType::parse(""), EventType::Unknown);
    }

    #[test]
    fn test_event_type_parse_is_case_insensitive() {
        assert_eq!(EventType::parse("Order.Approved"), EventType::OrderApproved);
        assert_eq!(
            EventType::parse(" CHECKOUT.ABANDONED "),
            EventType::CheckoutAbandoned
        );
    }

    #[test]
    fn test_from_json_full_envelope() {
        let body = br#"{
            "event": "order.approved",
            "token": "shh",
            "data": {
                "customer_email": "ana@example.com",
                "customer_name": "Ana Souza",
                "product_id": "3421876",
                "product_name": "Glow Academy"
            }
        }"#;

        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.event, "order.approved");
        assert_eq!(event.event_type, EventType::OrderApproved);
        assert_eq!(event.token.as_deref(), Some("shh"));
        assert_eq!(event.email.as_deref(), Some("ana@example.com"));
        assert_eq!(event.name.as_deref(), Some("Ana Souza"));
        assert_eq!(event.product_id, "3421876");
        assert_eq!(event.product_name.as_deref(), Some("Glow Academy"));
    }

    #[test]
    fn test_from_json_alias_fields() {
        let body = br#"{
            "event": "order.approved",
            "data": { "email": "b@x.com", "name": "B" }
        }"#;

        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.email.as_deref(), Some("b@x.com"));
        assert_eq!(event.name.as_deref(), Some("B"));
    }

    #[test]
    fn test_from_json_primary_field_wins_over_alias() {
        let body = br#"{
            "event": "order.approved",
            "data": {
                "customer_email": "primary@x.com",
                "email": "alias@x.com"
            }
        }"#;

        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.email.as_deref(), Some("primary@x.com"));
    }

    #[test]
    fn test_from_json_numeric_product_id() {
        let body = br#"{"event": "order.approved", "data": {"product_id": 3421876}}"#;
        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.product_id, "3421876");
    }

    #[test]
    fn test_from_json_missing_fields_default() {
        let body = br"{}";
        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.event, "");
        assert_eq!(event.event_type, EventType::Unknown);
        assert!(event.token.is_none());
        assert!(event.email.is_none());
        assert!(event.name.is_none());
        assert_eq!(event.product_id, "");
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        assert!(WebhookEvent::from_json(b"not json at all").is_err());
        assert!(WebhookEvent::from_json(b"").is_err());
    }

    #[test]
    fn test_stringify_id_ignores_other_shapes() {
        assert_eq!(stringify_id(&Value::Null), "");
        assert_eq!(stringify_id(&Value::Bool(true)), "");
        assert_eq!(stringify_id(&serde_json::json!({"id": 1})), "");
    }
}
