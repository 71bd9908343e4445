//! Error taxonomy surfaced by list and mutation controllers.
//!
//! # Design
//! - Errors are plain cloneable data so controllers can keep them as view state.
//! - Only transport failures are retryable; server and validation errors surface immediately.

use serde_json::Value;
use tesoro_api_models::ErrorBody;
use thiserror::Error;

/// HTTP status that ends the admin session.
pub const UNAUTHORIZED: u16 = 401;

/// Failures visible to list screens and forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    /// The request never produced an HTTP response.
    #[error("network request failed: {message}")]
    Network {
        /// Transport-level detail.
        message: String,
    },
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error envelope.
        message: String,
    },
    /// Client-side validation blocked the submission.
    #[error("{field} {reason}")]
    Validation {
        /// Form field that failed validation.
        field: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },
}

impl UiError {
    /// Transport failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Validation failure for `field`.
    #[must_use]
    pub const fn validation(field: &'static str, reason: &'static str) -> Self {
        Self::Validation { field, reason }
    }

    /// Map a non-2xx response and its body to a server error.
    #[must_use]
    pub fn from_response(status: u16, body: &Value) -> Self {
        Self::Server {
            status,
            message: ErrorBody::from_value(body).message(),
        }
    }

    /// Whether a retry may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether the server rejected the session credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status == UNAUTHORIZED)
    }

    /// Short text for toasts and empty states.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } => "Network error, please retry".to_string(),
            Self::Server { message, .. } => message.clone(),
            Self::Validation { .. } => self.to_string(),
        }
    }
}
