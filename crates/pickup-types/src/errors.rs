//! # Error Types
//!
//! The failure taxonomy shared by every pickup service. The gateway maps
//! each variant to one HTTP status.

use thiserror::Error;

/// Errors returned by the pickup services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Missing or malformed required fields.
    #[error("validation failed: {message}")]
    Validation { message: String, fields: Vec<String> },

    /// Credential absent, malformed, expired or signed with the wrong key.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The credential is valid but its subject no longer exists.
    #[error("identity not found")]
    IdentityNotFound,

    /// Role or ownership mismatch.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate email, student claimed by someone else, already released.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Release attempted before the school-reached signal.
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Backing store failure.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Validation error naming the offending fields.
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        CoreError::Validation {
            message: format!("Please provide all required fields: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
            fields: vec![field.into()],
        }
    }

    pub fn forbidden(details: impl Into<String>) -> Self {
        CoreError::Forbidden(details.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn conflict(details: impl Into<String>) -> Self {
        CoreError::Conflict(details.into())
    }

    /// True for failures the caller caused (4xx family).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Storage(_) | CoreError::Internal(_))
    }
}

/// Result type for pickup service operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_every_field() {
        let err = CoreError::missing_fields(["email", "password"]);
        match &err {
            CoreError::Validation { fields, message } => {
                assert_eq!(fields, &vec!["email".to_string(), "password".to_string()]);
                assert!(message.contains("email, password"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        assert!(!CoreError::Storage("disk".into()).is_client_error());
        assert!(!CoreError::Internal("boom".into()).is_client_error());
        assert!(CoreError::IdentityNotFound.is_client_error());
    }

    #[test]
    fn test_display() {
        let err = CoreError::PreconditionNotMet("parent must send school_reached first".into());
        assert!(err.to_string().contains("school_reached"));
    }
}
