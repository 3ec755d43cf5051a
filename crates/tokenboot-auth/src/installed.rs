//! Installed-application authorization flow.
//!
//! Implements the OAuth 2.0 Authorization Code flow with PKCE for desktop
//! applications, using a loopback redirect:
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind a local listener (an ephemeral port by default)
//! 3. Send the user's browser to the provider's consent page
//! 4. Wait for the provider to redirect back with a code or an error
//! 5. Exchange the code (with the verifier) for tokens
//!
//! The loopback listener only binds to `127.0.0.1`.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::flow::{AuthorizationFlow, BoxFuture, FlowBuilder};
use crate::secret::ClientSecret;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// How long a loopback connection may sit idle before it is dropped.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization Successful</h1>\
    <p>The authentication flow has completed. You may close this window.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h1>Authorization Failed</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

/// Options controlling how the installed-app flow runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOptions {
    /// Host name used in the redirect URI.
    pub host: String,

    /// Loopback port to listen on. `0` picks an ephemeral port.
    pub port: u16,

    /// Whether to open the user's browser on the consent page.
    pub open_browser: bool,

    /// How long to wait for the redirect. `None` waits indefinitely.
    pub callback_timeout: Option<Duration>,

    /// Timeout for the token exchange request.
    pub http_timeout: Duration,
}

impl FlowOptions {
    /// Default timeout for the token exchange request.
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    /// Sets the redirect host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the loopback port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables or disables opening the browser.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Sets the redirect wait timeout.
    pub fn with_callback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Sets the token exchange timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 0,
            open_browser: true,
            callback_timeout: None,
            http_timeout: Duration::from_secs(Self::DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Builds [`InstalledAppFlow`]s from client secret files.
#[derive(Debug, Clone, Default)]
pub struct InstalledAppFlowBuilder {
    options: FlowOptions,
}

impl InstalledAppFlowBuilder {
    /// Creates a builder with the given flow options.
    pub fn new(options: FlowOptions) -> Self {
        Self { options }
    }

    /// Returns the flow options.
    pub fn options(&self) -> &FlowOptions {
        &self.options
    }
}

impl FlowBuilder for InstalledAppFlowBuilder {
    fn build_flow(
        &self,
        client_secret_path: &Path,
        scopes: &[String],
    ) -> AuthResult<Box<dyn AuthorizationFlow>> {
        let secret = ClientSecret::from_file(client_secret_path)?;
        debug!(client_id = %secret.client_id, "loaded client secret");
        let flow = InstalledAppFlow::new(secret, scopes.to_vec(), self.options.clone())?;
        Ok(Box::new(flow))
    }
}

/// A prepared installed-app flow for one client and scope list.
#[derive(Debug)]
pub struct InstalledAppFlow {
    secret: ClientSecret,
    scopes: Vec<String>,
    options: FlowOptions,
    http_client: reqwest::Client,
}

impl InstalledAppFlow {
    /// Creates a flow for the given client and scopes.
    pub fn new(
        secret: ClientSecret,
        scopes: Vec<String>,
        options: FlowOptions,
    ) -> AuthResult<Self> {
        if scopes.is_empty() {
            return Err(AuthError::configuration(
                "at least one OAuth scope is required",
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(options.http_timeout)
            .user_agent(format!("tokenboot/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AuthError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(Self {
            secret,
            scopes,
            options,
            http_client,
        })
    }

    /// Returns the scopes this flow requests.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Runs the consent flow and returns the obtained credential.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The loopback port cannot be bound
    /// - The user denies authorization or the redirect state does not match
    /// - The redirect wait times out
    /// - Token exchange fails
    pub async fn authorize(&self) -> AuthResult<Credential> {
        self.authorize_with(PkceFlow::new()).await
    }

    async fn authorize_with(&self, pkce: PkceFlow) -> AuthResult<Credential> {
        let listener = bind_loopback(self.options.port)?;
        let port = listener
            .local_addr()
            .map_err(|e| {
                AuthError::network(format!("failed to read loopback address: {}", e))
                    .with_source(e)
            })?
            .port();
        let redirect_uri = format!("http://{}:{}/", self.options.host, port);

        let auth_url = pkce.build_auth_url(
            &self.secret.auth_uri,
            &self.secret.client_id,
            &redirect_uri,
            &self.scopes,
        )?;

        info!("starting authorization flow on port {}", port);
        debug!("authorization URL: {}", auth_url);

        eprintln!(
            "Please visit this URL to authorize this application: {}",
            auth_url
        );
        if self.options.open_browser {
            if let Err(e) = open::that(&auth_url) {
                warn!("failed to open browser: {}", e);
            }
        }

        let timeout = self.options.callback_timeout;
        let (code, received_state) =
            tokio::task::spawn_blocking(move || wait_for_callback(listener, timeout))
                .await
                .map_err(|e| {
                    AuthError::internal(format!("callback listener task failed: {}", e))
                        .with_source(e)
                })??;

        if received_state != pkce.state {
            return Err(AuthError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens...");
        self.exchange_code(&code, &pkce.verifier, &redirect_uri).await
    }

    /// Exchanges an authorization code for a credential.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<Credential> {
        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(&self.secret.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                AuthError::network(format!("token exchange request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthError::network(format!("failed to read response: {}", e)).with_source(e)
        })?;

        if !status.is_success() {
            return Err(AuthError::authentication(format!(
                "token exchange failed ({}): {}",
                status,
                describe_token_error(&body)
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::invalid_response(format!("invalid token response: {}", e)).with_source(e)
        })?;

        info!("successfully obtained tokens");
        Ok(token_response.into_credential(&self.secret, &self.scopes))
    }
}

impl AuthorizationFlow for InstalledAppFlow {
    fn run(&self) -> BoxFuture<'_, AuthResult<Credential>> {
        Box::pin(self.authorize())
    }
}

/// Binds the loopback listener.
fn bind_loopback(port: u16) -> AuthResult<TcpListener> {
    let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|e| {
        AuthError::configuration(format!("failed to bind loopback port {}: {}", port, e))
            .with_source(e)
    })?;
    debug!("bound loopback server on {:?}", listener.local_addr().ok());
    Ok(listener)
}

/// Waits for the redirect and extracts the authorization code and state.
fn wait_for_callback(
    listener: TcpListener,
    timeout: Option<Duration>,
) -> AuthResult<(String, String)> {
    let (tx, rx) = mpsc::channel();

    let _handle = thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    });

    let received = match timeout {
        Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => {
                AuthError::authentication("timed out waiting for the authorization redirect")
            }
            mpsc::RecvTimeoutError::Disconnected => {
                AuthError::internal("callback channel disconnected")
            }
        }),
        None => rx
            .recv()
            .map_err(|_| AuthError::internal("callback channel disconnected")),
    };

    received?
}

/// Handles one request on the loopback listener.
///
/// Returns `None` for requests that carry neither a code nor an error, so
/// the listener keeps waiting.
fn handle_callback(mut stream: TcpStream) -> Option<AuthResult<(String, String)>> {
    if let Err(e) = stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT)) {
        warn!("failed to set loopback read timeout: {}", e);
        return None;
    }

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return None;
    }

    // Drain the headers so closing the socket does not reset the connection.
    let mut header = String::new();
    while let Ok(n) = reader.read_line(&mut header) {
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
        header.clear();
    }

    let Some(params) = CallbackParams::from_request_line(&request_line) else {
        let _ = write_response(&mut stream, "404 Not Found", "");
        return None;
    };

    if let Some(error) = params.error {
        let _ = write_response(&mut stream, "400 Bad Request", FAILURE_PAGE);
        let message = match params.error_description {
            Some(description) => format!("authorization denied: {} ({})", error, description),
            None => format!("authorization denied: {}", error),
        };
        return Some(Err(AuthError::authentication(message)));
    }

    match params.code {
        Some(code) => {
            let _ = write_response(&mut stream, "200 OK", SUCCESS_PAGE);
            Some(Ok((code, params.state.unwrap_or_default())))
        }
        None => {
            let _ = write_response(&mut stream, "404 Not Found", "");
            None
        }
    }
}

fn write_response(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Query parameters of a redirect request.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Parses `GET /path?query HTTP/1.1`.
    ///
    /// Returns `None` unless the request is a `GET` carrying `code` or `error`.
    fn from_request_line(request_line: &str) -> Option<Self> {
        let mut parts = request_line.split_whitespace();
        if parts.next()? != "GET" {
            return None;
        }
        let target = parts.next()?;
        if !target.starts_with('/') {
            return None;
        }

        let url = Url::parse(&format!("http://localhost{}", target)).ok()?;
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        if params.code.is_none() && params.error.is_none() {
            return None;
        }
        Some(params)
    }
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        let state = random_token(16);

        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Builds the authorization URL for the consent page.
    pub fn build_auth_url(
        &self,
        auth_uri: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> AuthResult<String> {
        let mut url = Url::parse(auth_uri).map_err(|e| {
            AuthError::configuration(format!("invalid auth_uri {:?}: {}", auth_uri, e))
                .with_source(e)
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("code_challenge", &self.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", &self.state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.into())
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self, secret: &ClientSecret, scopes: &[String]) -> Credential {
        let mut credential = Credential::new(self.access_token, scopes.to_vec()).with_client(
            &secret.token_uri,
            &secret.client_id,
            &secret.client_secret,
        );
        if let Some(refresh_token) = self.refresh_token {
            credential = credential.with_refresh_token(refresh_token);
        }
        if let Some(expires_in) = self.expires_in {
            credential = credential.with_expires_in(expires_in);
        }
        credential
    }
}

/// Error body from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Renders a token endpoint error body for humans, falling back to the raw
/// body when it is not the standard JSON error shape.
fn describe_token_error(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{}: {}", error, description),
        Ok(TokenErrorResponse { error, .. }) => error,
        Err(_) => body.to_string(),
    }
}
