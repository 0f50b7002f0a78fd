//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the webhook sender. The handler returns
//! `Result<T, AppError>`; the sender only ever sees a status code and a
//! short text body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::reconcile::ReconcileError;
use kiwi_relay_core::ClassifyError;

/// Application-level error type for the relay.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request from the webhook sender.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Webhook token mismatch.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Reconciliation against the directory service failed.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::MalformedPayload(_) | ClassifyError::MissingEmail => {
                Self::BadRequest(err.to_string())
            }
            ClassifyError::Unauthorized => Self::Unauthorized(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Reconcile(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Reconcile(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to the sender
        let message = match &self {
            Self::Reconcile(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("missing email".to_string());
        assert_eq!(err.to_string(), "Bad request: missing email");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Reconcile(ReconcileError::Subscriber {
                email: "a@x.com".to_string(),
                source: DirectoryError::Api {
                    status: 500,
                    message: "boom".to_string()
                },
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_classify_errors_map_to_request_errors() {
        let err: AppError = ClassifyError::MissingEmail.into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = ClassifyError::MalformedPayload("nope".to_string()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = ClassifyError::Unauthorized.into();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
