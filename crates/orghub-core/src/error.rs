//! Unified application error types for OrgHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] taxonomy is what
//! the request boundary maps to a status code.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A required identifier or field was missing or malformed.
    Validation,
    /// The requested row or document was not found.
    NotFound,
    /// The actor was resolved but does not hold a sufficient rank or grant.
    Authorization,
    /// A uniqueness constraint was violated (duplicate name, duplicate rank, etc.).
    Conflict,
    /// A relational store error occurred.
    Database,
    /// A document store error occurred.
    DocumentStore,
    /// A store call exceeded its deadline.
    Timeout,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind is only detectable after a store round-trip failed
    /// for reasons unrelated to the caller's input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database
                | Self::DocumentStore
                | Self::Timeout
                | Self::Configuration
                | Self::Serialization
                | Self::Internal
        )
    }

    /// HTTP status code the request boundary reports for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authorization => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Timeout => 504,
            Self::Database
            | Self::DocumentStore
            | Self::Configuration
            | Self::Serialization
            | Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::DocumentStore => write!(f, "DOCUMENT_STORE"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout OrgHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a relational database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a document store error.
    pub fn document_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DocumentStore, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns true if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Prefix the message with the name of the operation that failed.
    pub fn context(mut self, operation: impl fmt::Display) -> Self {
        self.message = format!("{operation}: {}", self.message);
        self
    }

    /// Message safe to show to the caller.
    ///
    /// Infrastructure failures are reported as an opaque internal error.
    pub fn public_message(&self) -> String {
        if self.kind.is_infrastructure() {
            "internal error".to_string()
        } else {
            self.message.clone()
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_distinguishes_not_found_and_forbidden() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Authorization.status_code(), 403);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::Database.status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_infrastructure_details() {
        let err = AppError::database("connection reset by peer at 10.0.0.4");
        assert_eq!(err.public_message(), "internal error");

        let err = AppError::authorization("insufficient rank");
        assert_eq!(err.public_message(), "insufficient rank");
    }

    #[test]
    fn test_context_prefixes_operation() {
        let err = AppError::not_found("directory 42").context("delete_directory");
        assert_eq!(err.message, "delete_directory: directory 42");
        assert!(err.is(ErrorKind::NotFound));
    }
}
