//! Client secret descriptor parsing.
//!
//! The descriptor is the JSON file downloaded from the Google Cloud
//! Console OAuth 2.0 credentials page. It is read-only input: this crate
//! never creates or mutates it.

use std::path::Path;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Google's authorization endpoint, used when the descriptor omits `auth_uri`.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's token endpoint, used when the descriptor omits `token_uri`.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client identity parsed from a client secret descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Authorization endpoint the browser is sent to.
    pub auth_uri: String,
    /// Token endpoint the authorization code is exchanged at.
    pub token_uri: String,
    /// Redirect URIs registered for the client.
    pub redirect_uris: Vec<String>,
    /// Cloud project that owns the client, if present.
    pub project_id: Option<String>,
}

/// On-disk shape of the descriptor.
///
/// Accepts the console format with an `installed` or `web` section, and the
/// flat format with the fields at the root (as written by gcloud).
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    installed: Option<DescriptorSection>,
    web: Option<DescriptorSection>,
    #[serde(flatten)]
    flat: FlatSection,
}

#[derive(Debug, Deserialize)]
struct DescriptorSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
    #[serde(default)]
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatSection {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ClientSecret {
    /// Creates a client secret pointing at Google's endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URI.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            redirect_uris: Vec::new(),
            project_id: None,
        }
    }

    /// Reads and parses a descriptor file.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::configuration(format!(
                "failed to read client secret file {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses a descriptor from its JSON text.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let file: DescriptorFile = serde_json::from_str(json).map_err(|e| {
            AuthError::configuration(format!("failed to parse client secret JSON: {}", e))
                .with_source(e)
        })?;

        if let Some(section) = file.installed.or(file.web) {
            let secret = Self {
                client_id: section.client_id,
                client_secret: section.client_secret,
                auth_uri: section
                    .auth_uri
                    .unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
                token_uri: section
                    .token_uri
                    .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
                redirect_uris: section.redirect_uris,
                project_id: section.project_id,
            };
            secret.validate()?;
            return Ok(secret);
        }

        if let (Some(client_id), Some(client_secret)) =
            (file.flat.client_id, file.flat.client_secret)
        {
            let mut secret = Self::new(client_id, client_secret);
            if let Some(token_uri) = file.flat.token_uri {
                secret.token_uri = token_uri;
            }
            secret.validate()?;
            return Ok(secret);
        }

        Err(AuthError::configuration(
            "client secret file must contain an 'installed'/'web' section \
             or 'client_id'/'client_secret' at root level",
        ))
    }

    /// Checks that the identity fields are usable.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::configuration("client_id is required"));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::configuration("client_secret is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;

    #[test]
    fn from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "project_id": "my-project",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "test-secret",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "test-secret");
        assert_eq!(secret.project_id.as_deref(), Some("my-project"));
        assert_eq!(secret.redirect_uris, vec!["http://localhost".to_string()]);
    }

    #[test]
    fn from_json_web_uses_custom_endpoints() {
        let json = r#"{
            "web": {
                "client_id": "web-id",
                "client_secret": "web-secret",
                "auth_uri": "https://auth.example.com/authorize",
                "token_uri": "https://auth.example.com/token"
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.auth_uri, "https://auth.example.com/authorize");
        assert_eq!(secret.token_uri, "https://auth.example.com/token");
    }

    #[test]
    fn from_json_defaults_endpoints() {
        let json = r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(secret.token_uri, GOOGLE_TOKEN_URI);
        assert!(secret.redirect_uris.is_empty());
    }

    #[test]
    fn from_json_flat() {
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret",
            "refresh_token": "ignored"
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "flat-id.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "flat-secret");
        assert_eq!(secret.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn from_json_without_client_fields() {
        let err = ClientSecret::from_json(r#"{ "other": {} }"#).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::ConfigurationError);
        assert!(err.message().contains("client_id"));
    }

    #[test]
    fn from_json_malformed() {
        let err = ClientSecret::from_json("not json").unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::ConfigurationError);
        assert!(err.message().contains("parse"));
    }

    #[test]
    fn from_json_empty_secret_rejected() {
        let json = r#"{"installed": {"client_id": "id", "client_secret": ""}}"#;
        let err = ClientSecret::from_json(json).unwrap_err();
        assert!(err.message().contains("client_secret"));
    }

    #[test]
    fn from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecret::from_file(dir.path().join("credentials.json")).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::ConfigurationError);
        assert!(err.message().contains("credentials.json"));
    }
}
