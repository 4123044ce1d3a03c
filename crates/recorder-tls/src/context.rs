//! Process-wide TLS contexts
//!
//! Each context is built on first access and then shared, unchanged, until
//! the process exits. Concurrent first callers block while a single
//! initializer runs; all of them observe its result.

use crate::client::{build_client_context, ClientContext};
use crate::config::KeystoreSettings;
use crate::error::{Error, Result};
use crate::server::{build_server_context, ServerContext};
use once_cell::sync::OnceCell;

/// A value provisioned at most once, success or failure
///
/// A failed initialization is kept: later calls get the same error back
/// and the initializer never runs again.
#[derive(Debug)]
pub struct ProvisionedCell<T> {
    cell: OnceCell<Result<T>>,
}

impl<T> ProvisionedCell<T> {
    /// Create an empty cell
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the provisioned value, running `init` if this is the first call
    pub fn get_or_provision<F>(&self, init: F) -> std::result::Result<&T, &Error>
    where
        F: FnOnce() -> Result<T>,
    {
        self.cell.get_or_init(init).as_ref()
    }

    /// The value, if provisioning already ran and succeeded
    pub fn get(&self) -> Option<&T> {
        self.cell.get().and_then(|result| result.as_ref().ok())
    }
}

impl<T> Default for ProvisionedCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

static SERVER_CONTEXT: ProvisionedCell<ServerContext> = ProvisionedCell::new();
static CLIENT_CONTEXT: OnceCell<ClientContext> = OnceCell::new();

/// The process-wide client-facing context
///
/// Built from `RECORDER_TLS_*` environment overrides on first call. An error
/// here is permanent for the life of the process.
pub fn server_context() -> std::result::Result<&'static ServerContext, &'static Error> {
    SERVER_CONTEXT.get_or_provision(|| {
        let settings = KeystoreSettings::from_env()?;
        build_server_context(&settings)
    })
}

/// The process-wide upstream-facing context
pub fn client_context() -> &'static ClientContext {
    CLIENT_CONTEXT.get_or_init(build_client_context)
}
