//! Bootstrapper error types.

use std::io;

use thiserror::Error;
use tokenboot_auth::AuthError;

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Errors that end a bootstrap run.
///
/// A missing client secret file is not an error: it is reported as
/// [`BootstrapOutcome::MissingDescriptor`](crate::bootstrap::BootstrapOutcome).
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration file or option error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The authorization flow or credential storage failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Console or filesystem IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BootstrapError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_display_unchanged() {
        let err: BootstrapError =
            AuthError::authentication("authorization denied: access_denied").into();
        assert_eq!(
            err.to_string(),
            "authentication_failed: authorization denied: access_denied"
        );
    }

    #[test]
    fn config_error_display() {
        let err = BootstrapError::config("at least one scope is required");
        assert_eq!(
            err.to_string(),
            "configuration error: at least one scope is required"
        );
    }
}
