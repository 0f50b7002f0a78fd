//! Kiwify webhook intake.
//!
//! One handler, one event per request: classify the payload into a
//! reconciliation intent, reconcile it against MailerLite, and answer with
//! a short status body. Events that warrant no mutation (unhandled types,
//! suppressed unknown products, the abandoned-cart guard) are acknowledged
//! rather than rejected so the platform does not retry them.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use kiwi_relay_core::{Classification, SuppressReason, classify};

use crate::error::AppError;
use crate::reconcile::{ReconcileOutcome, reconcile};
use crate::state::AppState;

/// Handle one inbound Kiwify event.
#[instrument(skip(state, headers, body))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let classification = classify(
        &body,
        header_token(&headers),
        state.config().webhook_token(),
        state.products(),
        &state.classify_options(),
    )?;

    match classification {
        Classification::Ignored { event } => {
            info!(event = %event, "unhandled event type, acknowledged");
            Ok((StatusCode::OK, "ignored").into_response())
        }
        Classification::Suppressed(SuppressReason::UnknownProduct { product_id }) => {
            info!(product_id = %product_id, "unknown product, suppressed");
            Ok((StatusCode::ACCEPTED, "suppressed").into_response())
        }
        Classification::Actionable(intent) => {
            let outcome =
                reconcile(state.directory(), &intent, &state.reconcile_options()).await?;

            match outcome {
                ReconcileOutcome::Applied(report) => {
                    info!(
                        email = %intent.email,
                        subscriber_id = %report.subscriber_id,
                        created = report.created,
                        applied = report.applied(),
                        skipped = report.skipped(),
                        failed = report.failed(),
                        "reconciliation finished"
                    );
                    Ok((StatusCode::OK, "processed").into_response())
                }
                ReconcileOutcome::SuppressedByGuard => {
                    info!(email = %intent.email, "already converted, cart recovery suppressed");
                    Ok((StatusCode::OK, "already converted").into_response())
                }
                ReconcileOutcome::DryRun(steps) => {
                    info!(email = %intent.email, steps = steps.len(), "dry run, no remote mutation");
                    Ok((StatusCode::OK, "dry run").into_response())
                }
            }
        }
    }
}

/// Extract the shared-secret token from the request headers.
///
/// `x-kiwify-token` is the documented header; `x-token` is the legacy
/// spelling some sender configurations still use.
fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-kiwify-token")
        .or_else(|| headers.get("x-token"))
        .and_then(|value| value.to_str().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_token_prefers_kiwify_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-kiwify-token", "primary".parse().unwrap());
        headers.insert("x-token", "legacy".parse().unwrap());
        assert_eq!(header_token(&headers), Some("primary"));
    }

    #[test]
    fn test_header_token_falls_back_to_legacy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", "legacy".parse().unwrap());
        assert_eq!(header_token(&headers), Some("legacy"));
    }

    #[test]
    fn test_header_token_absent() {
        assert_eq!(header_token(&HeaderMap::new()), None);
    }
}
