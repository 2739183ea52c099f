//! Raisable API errors
//!
//! [`ApiError`] is the value application code returns (with `?` or `Err(..)`)
//! when a request cannot proceed. Nothing in this crate catches it: it travels
//! unchanged to the handler boundary, where axum calls [`IntoResponse`] and
//! the error is rendered as an error [`Envelope`] with the matching status.
//!
//! # Example
//!
//! ```rust
//! use acton_envelope::{ApiError, ApiErrorKind};
//!
//! fn find_task(id: u64) -> Result<&'static str, ApiError> {
//!     if id == 1 {
//!         Ok("write docs")
//!     } else {
//!         Err(ApiError::not_found().with_message("Task not found"))
//!     }
//! }
//!
//! let error = find_task(7).unwrap_err();
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.status_code().as_u16(), 404);
//! assert_eq!(error.message(), "Task not found");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::envelope::Envelope;
use crate::error::SerializationError;

/// Category of API error
///
/// A closed set: each kind has a fixed status code and default message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Invalid request format or parameters (400)
    BadRequest,
    /// Authentication required (401)
    NotAuthorized,
    /// Access denied (403)
    Forbidden,
    /// Resource was not found (404)
    NotFound,
    /// Unexpected failure (500)
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::NotAuthorized => write!(f, "not_authorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::Internal => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotAuthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when the caller supplies none
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::NotAuthorized => "Not authorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not found",
            Self::Internal => "Internal error",
        }
    }
}

/// An API error raised by application code
///
/// Carries the [`ApiErrorKind`] and an optional message overriding the
/// kind's default.
///
/// For [`ApiErrorKind::Internal`] the override is treated as a diagnostic: it
/// is logged at the boundary and never sent to the client, which always sees
/// the generic default message.
///
/// # Example
///
/// ```rust
/// use acton_envelope::ApiError;
///
/// let error = ApiError::internal().with_message("connection pool exhausted");
/// assert_eq!(error.message(), "connection pool exhausted");
/// assert_eq!(error.public_message(), "Internal error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The category of error
    pub kind: ApiErrorKind,
    /// Caller-supplied message overriding the default
    pub message: Option<String>,
}

impl ApiError {
    /// Create an error of the given kind with its default message
    #[must_use]
    pub const fn new(kind: ApiErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// 400 Bad request
    #[must_use]
    pub const fn bad_request() -> Self {
        Self::new(ApiErrorKind::BadRequest)
    }

    /// 401 Not authorized
    #[must_use]
    pub const fn not_authorized() -> Self {
        Self::new(ApiErrorKind::NotAuthorized)
    }

    /// 403 Forbidden
    #[must_use]
    pub const fn forbidden() -> Self {
        Self::new(ApiErrorKind::Forbidden)
    }

    /// 404 Not found
    #[must_use]
    pub const fn not_found() -> Self {
        Self::new(ApiErrorKind::NotFound)
    }

    /// 500 Internal error
    #[must_use]
    pub const fn internal() -> Self {
        Self::new(ApiErrorKind::Internal)
    }

    /// Override the default message
    ///
    /// Blank messages are ignored so the envelope never carries an empty
    /// `message`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_envelope::ApiError;
    ///
    /// let error = ApiError::bad_request().with_message("Unknown sort key");
    /// assert_eq!(error.message(), "Unknown sort key");
    ///
    /// let blank = ApiError::bad_request().with_message("   ");
    /// assert_eq!(blank.message(), "Bad request");
    /// ```
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.message = Some(message);
        }
        self
    }

    /// HTTP status code carried by this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Default message of this error's kind
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        self.kind.default_message()
    }

    /// The override message if one was given, otherwise the default
    #[must_use]
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message())
    }

    /// The message that is safe to send to the client
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self.kind {
            ApiErrorKind::Internal => self.kind.default_message(),
            _ => self.message(),
        }
    }

    /// Consume the error and build the error envelope
    ///
    /// This is the boundary conversion: it logs the error once and produces
    /// the body and status sent to the client.
    pub fn into_envelope(self) -> Envelope {
        let status = self.status_code();

        match self.kind {
            ApiErrorKind::Internal => {
                tracing::error!(
                    kind = %self.kind,
                    status = status.as_u16(),
                    diagnostic = ?self.message,
                    "API error: {}", self.kind.default_message()
                );
            }
            _ => {
                tracing::warn!(
                    kind = %self.kind,
                    status = status.as_u16(),
                    "API error: {}", self.message()
                );
            }
        }

        Envelope::failure(status, self.public_message())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error ({}): {}",
            self.kind,
            self.status_code().as_u16(),
            self.message()
        )
    }
}

impl std::error::Error for ApiError {}

impl From<ApiErrorKind> for ApiError {
    fn from(kind: ApiErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<SerializationError> for ApiError {
    fn from(err: SerializationError) -> Self {
        Self::bad_request().with_message(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeStatus;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    #[test]
    fn test_api_error_kind_display() {
        assert_eq!(format!("{}", ApiErrorKind::BadRequest), "bad_request");
        assert_eq!(format!("{}", ApiErrorKind::NotAuthorized), "not_authorized");
        assert_eq!(format!("{}", ApiErrorKind::Forbidden), "forbidden");
        assert_eq!(format!("{}", ApiErrorKind::NotFound), "not_found");
        assert_eq!(format!("{}", ApiErrorKind::Internal), "internal_error");
    }

    #[test]
    fn test_api_error_kind_status_codes() {
        assert_eq!(ApiErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::NotAuthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiErrorKind::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_kind_default_messages() {
        assert_eq!(ApiErrorKind::BadRequest.default_message(), "Bad request");
        assert_eq!(ApiErrorKind::NotAuthorized.default_message(), "Not authorized");
        assert_eq!(ApiErrorKind::Forbidden.default_message(), "Forbidden");
        assert_eq!(ApiErrorKind::NotFound.default_message(), "Not found");
        assert_eq!(ApiErrorKind::Internal.default_message(), "Internal error");
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(ApiError::bad_request().kind, ApiErrorKind::BadRequest);
        assert_eq!(ApiError::not_authorized().kind, ApiErrorKind::NotAuthorized);
        assert_eq!(ApiError::forbidden().kind, ApiErrorKind::Forbidden);
        assert_eq!(ApiError::not_found().kind, ApiErrorKind::NotFound);
        assert_eq!(ApiError::internal().kind, ApiErrorKind::Internal);
        assert!(ApiError::not_found().message.is_none());
    }

    #[test]
    fn test_message_override() {
        let error = ApiError::not_found().with_message("Task not found");
        assert_eq!(error.message(), "Task not found");
        assert_eq!(error.public_message(), "Task not found");
        assert_eq!(error.default_message(), "Not found");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let error = ApiError::forbidden().with_message("");
        assert!(error.message.is_none());
        assert_eq!(error.message(), "Forbidden");
    }

    #[test]
    fn test_internal_override_is_not_public() {
        let error = ApiError::internal().with_message("db password rejected");
        assert_eq!(error.public_message(), "Internal error");

        let envelope = error.into_envelope();
        assert_eq!(envelope.message(), Some("Internal error"));
        assert_eq!(envelope.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display() {
        let error = ApiError::not_authorized().with_message("Token expired");
        let display = format!("{}", error);
        assert!(display.contains("not_authorized"));
        assert!(display.contains("401"));
        assert!(display.contains("Token expired"));
    }

    #[test]
    fn test_error_is_error_trait() {
        let error: Box<dyn std::error::Error> = Box::new(ApiError::not_found());
        assert!(error.to_string().contains("not_found"));
    }

    #[test]
    fn test_from_kind() {
        let error: ApiError = ApiErrorKind::Forbidden.into();
        assert_eq!(error, ApiError::forbidden());
    }

    #[test]
    fn test_from_serialization_error() {
        let error: ApiError = SerializationError::MissingField("owner".to_string()).into();
        assert_eq!(error.kind, ApiErrorKind::BadRequest);
        assert!(error.message().contains("owner"));
    }

    #[test]
    fn test_into_envelope_shape() {
        let envelope = ApiError::forbidden().into_envelope();
        assert_eq!(envelope.status(), EnvelopeStatus::Error);
        assert_eq!(envelope.status_code(), StatusCode::FORBIDDEN);
        assert!(envelope.data().is_none());
        assert_eq!(envelope.message(), Some("Forbidden"));
    }

    #[tokio::test]
    async fn test_into_response_not_found() {
        let response = ApiError::not_found()
            .with_message("Task not found")
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({"status": "error", "data": null, "message": "Task not found"})
        );
    }

    #[tokio::test]
    async fn test_into_response_every_kind() {
        let kinds = [
            (ApiErrorKind::BadRequest, 400, "Bad request"),
            (ApiErrorKind::NotAuthorized, 401, "Not authorized"),
            (ApiErrorKind::Forbidden, 403, "Forbidden"),
            (ApiErrorKind::NotFound, 404, "Not found"),
            (ApiErrorKind::Internal, 500, "Internal error"),
        ];

        for (kind, status, message) in kinds {
            let response = ApiError::new(kind).into_response();
            assert_eq!(response.status().as_u16(), status);

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["status"], "error");
            assert_eq!(body["message"], message);
            assert!(body["data"].is_null());
        }
    }
}
