//! CLI and bootstrapper for installed-application OAuth tokens.
//!
//! This crate provides the `tokenboot` command-line tool.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use bootstrap::{BootstrapOutcome, Bootstrapper};
pub use cli::Cli;
pub use config::{BootstrapConfig, FlowSettings};
pub use error::{BootstrapError, BootstrapResult};
