//! The token bootstrapper.
//!
//! One linear pass: check the client secret file, build the flow, wait for
//! consent, serialize the credential, write it, report. The only recovered
//! condition is a missing client secret file; everything else ends the run
//! with a [`BootstrapError`].

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use tokenboot_auth::{CredentialStore, FlowBuilder, InstalledAppFlowBuilder};

use crate::config::BootstrapConfig;
use crate::error::BootstrapResult;

/// How a bootstrap run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The client secret file was absent. Nothing was attempted or written.
    MissingDescriptor {
        /// The path that was checked.
        path: PathBuf,
    },
    /// Consent was granted and the credential was written.
    Completed {
        /// Where the credential was written.
        token_path: PathBuf,
    },
}

/// Runs the consent flow and persists the credential.
#[derive(Debug)]
pub struct Bootstrapper<B> {
    config: BootstrapConfig,
    builder: B,
}

impl Bootstrapper<InstalledAppFlowBuilder> {
    /// Creates a bootstrapper using the browser-based installed-app flow
    /// configured by `config.flow`.
    pub fn installed(config: BootstrapConfig) -> Self {
        let builder = InstalledAppFlowBuilder::new(config.flow.to_options());
        Self::new(config, builder)
    }
}

impl<B: FlowBuilder> Bootstrapper<B> {
    /// Creates a bootstrapper with an explicit flow builder.
    pub fn new(config: BootstrapConfig, builder: B) -> Self {
        Self { config, builder }
    }

    /// Returns the flow builder.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Runs the bootstrap, writing the human-readable status line to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client secret cannot be parsed, consent fails
    /// or is denied, or the credential cannot be written. In each case the
    /// token file is left as it was before the run.
    pub async fn run<W: Write + Send>(&self, out: &mut W) -> BootstrapResult<BootstrapOutcome> {
        let secret_path = &self.config.client_secret_path;

        if !secret_path.exists() {
            info!("client secret file {:?} not found", secret_path);
            writeln!(
                out,
                "Missing {path}. Create an OAuth client in Google Cloud Console \
                 and save the JSON as {path}.",
                path = secret_path.display()
            )?;
            return Ok(BootstrapOutcome::MissingDescriptor {
                path: secret_path.clone(),
            });
        }

        debug!(scopes = ?self.config.scopes, "building authorization flow");
        let flow = self.builder.build_flow(secret_path, &self.config.scopes)?;

        info!("awaiting consent");
        let credential = flow.run().await?;

        let store = CredentialStore::new(&self.config.token_path);
        store.save(&credential)?;

        writeln!(out, "Saved credentials to {}", store.path().display())?;
        Ok(BootstrapOutcome::Completed {
            token_path: store.path().to_path_buf(),
        })
    }
}
