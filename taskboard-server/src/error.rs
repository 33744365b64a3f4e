//! Service-level errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskboard_proto::api::ValidationError;
use taskboard_proto::envelope::Envelope;

use crate::store::StoreError;

/// Errors surfaced by board operations.
///
/// Authorization and validation failures are always raised before any write.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// No session, no membership, or insufficient role.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed or inconsistent input.
    #[error("{0}")]
    Validation(String),

    /// A referenced document does not exist.
    #[error("{what} not found: {id}")]
    NotFound {
        /// Kind of document.
        what: &'static str,
        /// Requested id(s).
        id: String,
    },

    /// Some writes of a batch were applied and some were not.
    #[error("{} of {attempted} updates failed: {}", .failed.len(), .failed.join(", "))]
    PartialFailure {
        /// Number of writes attempted.
        attempted: usize,
        /// Ids whose write failed.
        failed: Vec<String>,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(StoreError),
}

impl BoardError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PartialFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::NotFound {
                what: collection.noun(),
                id,
            },
            other => Self::Store(other),
        }
    }
}

impl From<ValidationError> for BoardError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Backend details stay in the log.
            Self::Store(e) => {
                tracing::error!(error = %e, "store failure");
                if e.is_retryable() {
                    "Service temporarily unavailable".to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            other => other.to_string(),
        };
        (status, Json(Envelope::<()>::error(message))).into_response()
    }
}
