//! Error types for authorization and credential storage.
//!
//! Every failure the flow or the store can produce is an [`AuthError`]
//! carrying an [`AuthErrorCode`] that classifies it.

use std::fmt;
use thiserror::Error;

/// The category of an authorization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// The client secret descriptor or flow options are missing or invalid.
    ConfigurationError,
    /// The user denied consent, the provider rejected the request, or the
    /// redirect did not match the flow that issued it.
    AuthenticationFailed,
    /// Network error talking to the provider or the loopback listener.
    NetworkError,
    /// The provider answered with something we could not understand.
    InvalidResponse,
    /// Reading or writing the credential file failed.
    StorageError,
    /// Unexpected internal state.
    InternalError,
}

impl AuthErrorCode {
    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::StorageError => "storage_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while building or running an authorization flow, or
/// while persisting its credential.
#[derive(Debug, Error)]
pub struct AuthError {
    code: AuthErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AuthError {
    /// Creates a new error with the given code and message.
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ConfigurationError, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::NetworkError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidResponse, message)
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::StorageError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InternalError, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_names() {
        assert_eq!(
            AuthErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(AuthErrorCode::StorageError.as_str(), "storage_error");
    }

    #[test]
    fn error_creation() {
        let err = AuthError::authentication("access_denied");
        assert_eq!(err.code(), AuthErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "access_denied");
    }

    #[test]
    fn error_display() {
        let err = AuthError::configuration("client_id is required");
        assert_eq!(
            err.to_string(),
            "configuration_error: client_id is required"
        );
    }

    #[test]
    fn error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = AuthError::storage("failed to write token file").with_source(io_err);
        assert!(err.source().is_some());
    }
}
