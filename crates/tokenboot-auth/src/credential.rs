//! The credential produced by a successful authorization flow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// A token-bearing credential.
///
/// Serializes to the authorized-user JSON document Google's client
/// libraries read back: `token`, `refresh_token`, `token_uri`,
/// `client_id`, `client_secret`, `scopes`, `expiry`. Absent optional
/// fields are omitted rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The access token.
    pub token: String,

    /// The refresh token, when the provider granted offline access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token endpoint to use when refreshing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,

    /// Client ID the credential was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret needed for refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// The scopes that were requested, in request order.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// When the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a bare credential holding only an access token and scopes.
    pub fn new(token: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes,
            expiry: None,
        }
    }

    /// Sets the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Records the client identity and token endpoint needed for refresh.
    pub fn with_client(
        mut self,
        token_uri: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.token_uri = Some(token_uri.into());
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the expiry from a lifetime in seconds, counted from now.
    pub fn with_expires_in(mut self, expires_in_secs: i64) -> Self {
        self.expiry = Some(Utc::now() + Duration::seconds(expires_in_secs));
        self
    }

    /// Serializes the credential to its canonical JSON string.
    pub fn to_json(&self) -> AuthResult<String> {
        serde_json::to_string(self).map_err(|e| {
            AuthError::internal(format!("failed to serialize credential: {}", e)).with_source(e)
        })
    }

    /// Parses a credential from JSON.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AuthError::invalid_response(format!("failed to parse credential JSON: {}", e))
                .with_source(e)
        })
    }
}
