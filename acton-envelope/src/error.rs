//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api_error::ApiError;
use crate::envelope::Envelope;

// ============================================================================
// Field Extraction Errors
// ============================================================================

/// Failure while extracting whitelisted fields from a record
///
/// These always indicate caller misuse: the field list is chosen by the
/// caller, so a name that does not resolve is a programming error and is
/// reported immediately instead of being silently defaulted.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The field list was empty
    #[error("field list must name at least one field")]
    EmptyFieldSpec,

    /// The same name appears twice in the field list
    #[error("field `{0}` is listed more than once")]
    DuplicateField(String),

    /// A listed field is not readable on the record
    #[error("field `{0}` is not readable on this record")]
    MissingField(String),

    /// A listed field produced a value that cannot be represented as JSON
    #[error("field `{field}` is not representable as JSON: {source}")]
    InvalidValue {
        /// Name of the offending field
        field: String,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },

    /// A free-form payload could not be converted to JSON
    #[error("response payload is not representable as JSON: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

impl SerializationError {
    /// Name of the field involved, if the error concerns a single field
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::DuplicateField(field) | Self::MissingField(field) => Some(field),
            Self::InvalidValue { field, .. } => Some(field),
            Self::EmptyFieldSpec | Self::InvalidPayload(_) => None,
        }
    }
}

// ============================================================================
// Crate Error
// ============================================================================

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by acton-envelope
///
/// Every variant renders as an error envelope through [`IntoResponse`], so a
/// handler returning `Result<Envelope>` can use `?` on any operation of this
/// crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Configuration or forced pagination values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tracing subscriber could not be installed
    #[error("Tracing initialization failed: {0}")]
    Tracing(String),

    /// Field extraction failed
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// An API error was raised
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl Error {
    /// HTTP status code this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Api(e) => e.status_code(),
            Error::Serialization(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) | Error::InvalidConfig(_) | Error::Tracing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert into the error envelope sent to the client
    pub fn into_envelope(self) -> Envelope {
        match self {
            Error::Api(e) => e.into_envelope(),
            Error::Serialization(e) => ApiError::from(e).into_envelope(),
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                Envelope::internal_error()
            }
            Error::InvalidConfig(msg) => {
                tracing::error!("Invalid configuration: {}", msg);
                Envelope::internal_error()
            }
            Error::Tracing(msg) => {
                tracing::error!("Tracing error: {}", msg);
                Envelope::internal_error()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_envelope().into_response()
    }
}
