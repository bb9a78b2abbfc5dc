//! Gateway error types and their HTTP rendering.
//!
//! | `CoreError` | Status | Notes |
//! |-------------|--------|-------|
//! | `Validation` | 400 | body carries `fields` |
//! | `Unauthenticated`, `IdentityNotFound` | 401 | `WWW-Authenticate: Bearer` |
//! | `Forbidden` | 403 | |
//! | `NotFound` | 404 | |
//! | `Conflict` | 409 | |
//! | `PreconditionNotMet` | 400 | |
//! | `Storage`, `Internal` | 500 | message hidden in production |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use pickup_types::CoreError;

/// Message shown in place of internal failure details in production.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// Response extension marking a 500 whose message may leak internals.
#[derive(Debug, Clone, Copy)]
pub struct InternalFailure;

/// Caller-facing failure.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Vec<String>,
}

/// Result type for gateway handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Validation failure naming one field.
    pub fn missing(field: &str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status.is_server_error()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message, fields } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                fields,
            },
            CoreError::Unauthenticated(message) => Self::new(StatusCode::UNAUTHORIZED, message),
            CoreError::IdentityNotFound => Self::new(StatusCode::UNAUTHORIZED, "User not found"),
            CoreError::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message),
            CoreError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            CoreError::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            CoreError::PreconditionNotMet(message) => Self::new(StatusCode::BAD_REQUEST, message),
            err @ (CoreError::Storage(_) | CoreError::Internal(_)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

/// Oversized bodies keep their 413; every other body failure is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, rejection.body_text())
            }
            _ => Self::bad_request(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    fields: &'a [String],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            error!(status = %self.status, message = %self.message, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            message: &self.message,
            fields: &self.fields,
        };
        let mut response = (self.status, Json(body)).into_response();

        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if self.is_internal() {
            response.extensions_mut().insert(InternalFailure);
        }
        response
    }
}

/// Startup and lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an error
    #[error("server error: {0}")]
    Serve(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<crate::domain::config::ConfigError> for GatewayError {
    fn from(err: crate::domain::config::ConfigError) -> Self {
        GatewayError::Config(err.to_string())
    }
}
