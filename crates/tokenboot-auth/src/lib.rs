//! Installed-application OAuth flow, credential model and storage.
//!
//! This crate provides everything the bootstrapper delegates:
//!
//! - [`ClientSecret`] - The client secret descriptor downloaded from the console
//! - [`FlowBuilder`] / [`AuthorizationFlow`] - The flow capability seam
//! - [`InstalledAppFlowBuilder`] - PKCE + loopback redirect implementation
//! - [`Credential`] - The token-bearing result and its JSON contract
//! - [`CredentialStore`] - Atomic persistence of the credential
//! - [`AuthError`] - Error types for all of the above
//!
//! # Flow
//!
//! ```text
//! credentials.json ──► FlowBuilder::build_flow ──► AuthorizationFlow::run
//!                                                        │
//!                          browser consent ◄─────────────┤
//!                          loopback redirect ────────────┤
//!                          code exchange ────────────────┘
//!                                                        │
//!                                                        ▼
//!                                   Credential ──► CredentialStore ──► token.json
//! ```

pub mod credential;
pub mod error;
pub mod flow;
pub mod installed;
pub mod secret;
pub mod store;

pub use credential::Credential;
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use flow::{AuthorizationFlow, BoxFuture, FlowBuilder};
pub use installed::{FlowOptions, InstalledAppFlow, InstalledAppFlowBuilder, PkceFlow};
pub use secret::{ClientSecret, GOOGLE_AUTH_URI, GOOGLE_TOKEN_URI};
pub use store::CredentialStore;
