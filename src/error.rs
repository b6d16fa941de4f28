//! Error types
//!
//! Two layers of errors live here:
//!
//! - [`BackendError`] - a failure reported by (or while talking to) SQS, SNS
//!   or DynamoDB.
//! - [`ApiError`] - everything a request can end with other than success.
//!   It converts into the JSON [`ErrorEnvelope`] returned to the caller.

use crate::resource::ResourceKind;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Failure reported by a backend service
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never got a response (connection refused, DNS, TLS...)
    #[error("Failed to send request to {kind}: {source}")]
    Transport {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{kind} request failed: {status}")]
    Service {
        kind: ResourceKind,
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    /// The service answered 2xx but the body was not what we expected
    #[error("Unexpected {kind} response: {reason}")]
    Malformed { kind: ResourceKind, reason: String },
}

impl BackendError {
    /// Human-readable message from the service, falling back to the error's own text
    pub fn message(&self) -> String {
        match self {
            BackendError::Service {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }

    /// Service error code (e.g. `QueueDoesNotExist`), namespace prefix stripped
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Service {
                code: Some(code), ..
            } => Some(code.rsplit('#').next().unwrap_or(code)),
            _ => None,
        }
    }

    /// Whether the service error code is one of `codes`
    pub fn has_code(&self, codes: &[&str]) -> bool {
        self.code().is_some_and(|code| codes.contains(&code))
    }
}

/// JSON body of every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Outcome of a request that did not succeed
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required query parameters: {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    #[error("Invalid or missing JSON body")]
    InvalidBody,

    #[error("Missing required field in body: {0}")]
    MissingField(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{message}")]
    NotFound {
        message: String,
        details: Option<String>,
    },

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body could not be read
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_)
            | ApiError::InvalidBody
            | ApiError::MissingField(_)
            | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Backend(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Normalize into the caller-facing envelope
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ApiError::NotFound { message, details } => ErrorEnvelope {
                error: message.clone(),
                details: details.clone(),
            },
            ApiError::Backend(err) => ErrorEnvelope {
                error: err.message(),
                details: None,
            },
            other => ErrorEnvelope {
                error: other.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = self.envelope();

        if status.is_server_error() {
            tracing::error!("{} - {}", status, envelope.error);
        } else {
            tracing::warn!("{} - {}", status, envelope.error);
        }

        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
