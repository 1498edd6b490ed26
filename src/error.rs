//! Relay error types with HTTP status and wire error mapping.
//!
//! [`RelayError`] is the central error type. Over HTTP it renders as a
//! structured JSON body; over WebSocket the same code and message are sent
//! to the offending connection as an `error` event. No variant is fatal to
//! the process or to other connections.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "invalid field: meeting_id must not be empty"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category      | HTTP Status               |
/// |-----------|---------------|---------------------------|
/// | 1000–1999 | Input         | 400 Bad Request           |
/// | 2000–2999 | Session state | 409 Conflict              |
/// | 3000–3999 | Server        | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Frame could not be decoded into a known event.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Event decoded but a field value is unacceptable.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Binary frames carry no signaling meaning.
    #[error("unsupported frame: only text frames are accepted")]
    UnsupportedFrame,

    /// The connection already has a participant record.
    #[error("connection {0} has already joined a meeting")]
    AlreadyJoined(ConnectionId),

    /// The connection has not joined a meeting yet.
    #[error("connection {0} has not joined a meeting")]
    NotJoined(ConnectionId),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedEvent(_) => 1001,
            Self::InvalidField(_) => 1002,
            Self::UnsupportedFrame => 1003,
            Self::AlreadyJoined(_) => 2001,
            Self::NotJoined(_) => 2002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedEvent(_) | Self::InvalidField(_) | Self::UnsupportedFrame => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyJoined(_) | Self::NotJoined(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON error body for this variant.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
            details: None,
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_body(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
