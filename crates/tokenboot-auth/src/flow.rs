//! Authorization flow capability.
//!
//! The bootstrapper only needs two operations from an authorization
//! library: build a flow from a client secret file and a scope list, and
//! run it until it yields a credential. Keeping them behind traits lets a
//! scripted flow stand in for the browser and the network.
//!
//! # Example
//!
//! ```ignore
//! use tokenboot_auth::{AuthorizationFlow, FlowBuilder, InstalledAppFlowBuilder};
//!
//! let builder = InstalledAppFlowBuilder::default();
//! let flow = builder.build_flow(Path::new("credentials.json"), &scopes)?;
//! let credential = flow.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::credential::Credential;
use crate::error::AuthResult;

/// A boxed future, used to keep the flow traits object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Builds an authorization flow from a client secret descriptor.
pub trait FlowBuilder: Send + Sync {
    /// Reads the descriptor at `client_secret_path` and prepares a flow that
    /// will request `scopes`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be read or parsed.
    fn build_flow(
        &self,
        client_secret_path: &Path,
        scopes: &[String],
    ) -> AuthResult<Box<dyn AuthorizationFlow>>;
}

/// A prepared authorization flow.
pub trait AuthorizationFlow: Send + Sync {
    /// Runs the flow to completion.
    ///
    /// The returned future does not resolve until consent succeeds, fails,
    /// or is aborted, and yields at most one credential.
    fn run(&self) -> BoxFuture<'_, AuthResult<Credential>>;
}
