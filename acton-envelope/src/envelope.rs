//! The JSON response envelope
//!
//! Every response produced by this crate, success or failure, has the same
//! shape:
//!
//! ```json
//! {
//!   "status": "ok",
//!   "data": { "id": 5, "name": "x" },
//!   "message": null,
//!   "meta": { "page_number": 1, "page_size": 10, "total_count": 1, "total_pages": 1 }
//! }
//! ```
//!
//! `meta` is present on paginated responses only. On error `data` is `null`
//! and `message` is always a non-empty string.
//!
//! The HTTP status code travels alongside the envelope but is not part of
//! the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome marker of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// The request succeeded
    Ok,
    /// The request failed
    Error,
}

/// Pagination metadata for page responses
///
/// # Example
///
/// ```rust
/// use acton_envelope::PageMeta;
///
/// let meta = PageMeta::new(2, 10, 25);
/// assert_eq!(meta.total_pages, 3);
/// assert_eq!(meta.offset(), 10);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    /// Current page number (1-indexed)
    pub page_number: u64,
    /// Number of items per page
    pub page_size: u64,
    /// Total number of items across all pages
    pub total_count: u64,
    /// Total number of pages
    pub total_pages: u64,
}

impl PageMeta {
    /// Create new pagination metadata
    ///
    /// `total_pages` is computed as `ceil(total_count / page_size)`.
    #[must_use]
    pub fn new(page_number: u64, page_size: u64, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_number,
            page_size,
            total_count,
            total_pages: calculate_total_pages(total_count, page_size),
        }
    }

    /// Number of items skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page_number.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Whether a page follows this one
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }
}

/// Ceiling division, zero items means zero pages
fn calculate_total_pages(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size)
}

/// Standardized response envelope
///
/// Construct success envelopes through [`ResponseBuilder`](crate::ResponseBuilder)
/// or [`Envelope::success`], and error envelopes through the named
/// constructors or by converting an [`ApiError`](crate::ApiError).
///
/// # Example
///
/// ```rust
/// use acton_envelope::{Envelope, EnvelopeStatus};
///
/// let envelope = Envelope::not_found().with_message("Task not found");
/// assert_eq!(envelope.status(), EnvelopeStatus::Error);
/// assert_eq!(envelope.status_code().as_u16(), 404);
/// assert_eq!(envelope.message(), Some("Task not found"));
/// assert!(envelope.data().is_none());
/// ```
///
/// Deserializing checks the outcome shape: an error envelope must have a
/// non-blank `message` and no `data` or `meta`, a success envelope must have
/// `data`. The HTTP status is not part of the body, so a decoded success
/// reports 200 and a decoded error reports 500.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Envelope {
    #[serde(skip)]
    status_code: StatusCode,
    status: EnvelopeStatus,
    data: Option<Value>,
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<PageMeta>,
}

impl Envelope {
    // ------------------------------------------------------------------------
    // Success
    // ------------------------------------------------------------------------

    /// 200 OK envelope around already-serialized data
    pub fn success(data: Value) -> Self {
        Self {
            status_code: StatusCode::OK,
            status: EnvelopeStatus::Ok,
            data: Some(data),
            message: None,
            meta: None,
        }
    }

    /// 200 OK page envelope
    pub fn page(items: Vec<Value>, meta: PageMeta) -> Self {
        Self {
            meta: Some(meta),
            ..Self::success(Value::Array(items))
        }
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    /// Error envelope with an explicit status and message
    ///
    /// A blank message falls back to the status' canonical reason phrase.
    pub fn failure(status_code: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            status_code.canonical_reason().unwrap_or("Error").to_string()
        } else {
            message
        };

        Self {
            status_code,
            status: EnvelopeStatus::Error,
            data: None,
            message: Some(message),
            meta: None,
        }
    }

    /// 400 Bad request
    pub fn bad_request() -> Self {
        Self::failure(StatusCode::BAD_REQUEST, "Bad request")
    }

    /// 401 Not authorized
    pub fn not_authorized() -> Self {
        Self::failure(StatusCode::UNAUTHORIZED, "Not authorized")
    }

    /// 403 Forbidden
    pub fn forbidden() -> Self {
        Self::failure(StatusCode::FORBIDDEN, "Forbidden")
    }

    /// 404 Not found
    pub fn not_found() -> Self {
        Self::failure(StatusCode::NOT_FOUND, "Not found")
    }

    /// 404 for routes that do not exist
    pub fn invalid_endpoint() -> Self {
        Self::failure(StatusCode::NOT_FOUND, "Invalid endpoint")
    }

    /// 405 Method not allowed
    pub fn method_not_allowed() -> Self {
        Self::failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    /// 500 Internal error
    pub fn internal_error() -> Self {
        Self::failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }

    /// 501 Not implemented
    pub fn not_implemented() -> Self {
        Self::failure(StatusCode::NOT_IMPLEMENTED, "Not implemented")
    }

    /// Set the message
    ///
    /// On a success envelope this adds an informational message. On an error
    /// envelope it replaces the default; blank messages are ignored.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.message = Some(message);
        }
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// HTTP status code the envelope is sent with
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Outcome marker
    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    /// Whether this is a success envelope
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Ok
    }

    /// Response payload, `None` on error
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Message, always present on error
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Pagination metadata, present on page responses
    pub fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    /// Take the payload out of the envelope
    pub fn into_data(self) -> Option<Value> {
        self.data
    }
}

/// Wire form of an envelope before its shape is checked
#[derive(Deserialize)]
struct RawEnvelope {
    status: EnvelopeStatus,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match raw.status {
            EnvelopeStatus::Ok => {
                if raw.data.is_none() {
                    return Err("success envelope without data".to_string());
                }
                Ok(Self {
                    status_code: StatusCode::OK,
                    status: EnvelopeStatus::Ok,
                    data: raw.data,
                    message: raw.message,
                    meta: raw.meta,
                })
            }
            EnvelopeStatus::Error => {
                if raw.data.is_some() {
                    return Err("error envelope carries data".to_string());
                }
                if raw.meta.is_some() {
                    return Err("error envelope carries page metadata".to_string());
                }
                match raw.message {
                    Some(message) if !message.trim().is_empty() => Ok(Self {
                        status_code: StatusCode::INTERNAL_SERVER_ERROR,
                        status: EnvelopeStatus::Error,
                        data: None,
                        message: Some(message),
                        meta: None,
                    }),
                    _ => Err("error envelope without a message".to_string()),
                }
            }
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
