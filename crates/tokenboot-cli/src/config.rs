//! Bootstrap configuration.
//!
//! Defaults reproduce the fixed behaviour: read `credentials.json`, write
//! `token.json`, request read-only calendar access. An optional TOML file
//! and command-line flags override them, in that order:
//!
//! ```toml
//! client_secret_path = "secrets/client.json"
//! token_path = "secrets/token.json"
//! scopes = ["https://www.googleapis.com/auth/calendar.readonly"]
//!
//! [flow]
//! port = 8085
//! open_browser = false
//! callback_timeout_secs = 300
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokenboot_auth::FlowOptions;

use crate::cli::Cli;
use crate::error::{BootstrapError, BootstrapResult};

/// Configuration for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Where to read the client secret descriptor.
    pub client_secret_path: PathBuf,

    /// Where to write the credential.
    pub token_path: PathBuf,

    /// Scopes to request, in order.
    pub scopes: Vec<String>,

    /// Installed-app flow settings.
    pub flow: FlowSettings,
}

impl BootstrapConfig {
    /// Default client secret descriptor path.
    pub const DEFAULT_CLIENT_SECRET_PATH: &'static str = "credentials.json";

    /// Default credential output path.
    pub const DEFAULT_TOKEN_PATH: &'static str = "token.json";

    /// Default OAuth scope for read-only calendar access.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Loads configuration from a TOML file. Unset keys keep their defaults.
    pub fn load_from(path: &Path) -> BootstrapResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| BootstrapError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Applies command-line overrides.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(ref path) = cli.client_secret {
            self.client_secret_path = path.clone();
        }
        if let Some(ref path) = cli.token {
            self.token_path = path.clone();
        }
        if !cli.scope.is_empty() {
            self.scopes = cli.scope.clone();
        }
        if let Some(port) = cli.port {
            self.flow.port = port;
        }
        if cli.no_browser {
            self.flow.open_browser = false;
        }
        self
    }

    /// Sets the client secret descriptor path.
    pub fn with_client_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secret_path = path.into();
        self
    }

    /// Sets the credential output path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the scopes to request.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> BootstrapResult<()> {
        if self.scopes.is_empty() {
            return Err(BootstrapError::config("at least one OAuth scope is required"));
        }
        if self.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err(BootstrapError::config("OAuth scopes must not be blank"));
        }
        if self.flow.host.is_empty() {
            return Err(BootstrapError::config("flow host must not be empty"));
        }
        Ok(())
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from(Self::DEFAULT_CLIENT_SECRET_PATH),
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_PATH),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            flow: FlowSettings::default(),
        }
    }
}

/// Settings for the installed-app flow, as they appear in the `[flow]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Host name used in the redirect URI.
    pub host: String,

    /// Loopback port, `0` for an ephemeral port.
    pub port: u16,

    /// Whether to open the browser automatically.
    pub open_browser: bool,

    /// Seconds to wait for the redirect. Unset waits indefinitely.
    pub callback_timeout_secs: Option<u64>,

    /// Seconds allowed for the token exchange request.
    pub http_timeout_secs: u64,
}

impl FlowSettings {
    /// Converts to the flow options understood by the auth crate.
    pub fn to_options(&self) -> FlowOptions {
        FlowOptions::default()
            .with_host(&self.host)
            .with_port(self.port)
            .with_open_browser(self.open_browser)
            .with_callback_timeout(self.callback_timeout_secs.map(Duration::from_secs))
            .with_http_timeout(Duration::from_secs(self.http_timeout_secs))
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        let options = FlowOptions::default();
        Self {
            host: options.host,
            port: options.port,
            open_browser: options.open_browser,
            callback_timeout_secs: options.callback_timeout.map(|d| d.as_secs()),
            http_timeout_secs: options.http_timeout.as_secs(),
        }
    }
}
