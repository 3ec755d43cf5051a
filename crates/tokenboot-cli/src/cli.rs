//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::TracingOutputFormat;

/// tokenboot - Run an OAuth consent flow and save the credential to disk
///
/// With no arguments, reads `credentials.json`, requests read-only
/// calendar access and writes `token.json` in the current directory.
#[derive(Debug, Parser)]
#[command(name = "tokenboot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format on stderr
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    /// Path to the OAuth client secret JSON from the cloud console
    #[arg(long, value_name = "PATH")]
    pub client_secret: Option<PathBuf>,

    /// Path to write the credential to
    #[arg(long, value_name = "PATH")]
    pub token: Option<PathBuf>,

    /// Scope to request (can be repeated, replaces the default scope)
    #[arg(long, action = clap::ArgAction::Append)]
    pub scope: Vec<String>,

    /// Loopback port for the redirect (0 picks a free port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,
}
