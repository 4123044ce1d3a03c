//! TLS contexts for the recording proxy
//!
//! The recorder sits between a client and the real upstream server, so it
//! needs two TLS postures:
//! - a server context presenting an identity loaded from a PKCS#12 keystore
//!   toward intercepted clients, without asking for client certificates
//! - a client context toward upstream servers that accepts any certificate
//!
//! # Credential resolution
//!
//! The keystore comes from `RECORDER_TLS_KEYSTORE` when set, otherwise from
//! the first copy of [`DEFAULT_KEYSTORE_RESOURCE`] found in a system
//! resource directory or, failing that, the copy compiled into this crate.
//! `RECORDER_TLS_KEYSTORE_PASSWORD` overrides the default passphrase.
//!
//! # Lifecycle
//!
//! [`server_context`] and [`client_context`] build their context once, on
//! first use, and hand out the same immutable value for the rest of the
//! process. Provisioning errors are fatal and are never retried.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod provider;
pub mod resolver;
pub mod server;
pub mod trust;

pub use client::{build_client_context, ClientContext};
pub use crate::config::{KeystoreSettings, DEFAULT_KEYSTORE_PASSWORD};
pub use context::{client_context, server_context, ProvisionedCell};
pub use error::{Error, Result};
pub use identity::{Identity, KeyManager};
pub use resolver::{
    CredentialOrigin, CredentialResolver, CredentialStream, ResourceLoader,
    DEFAULT_KEYSTORE_RESOURCE,
};
pub use server::{build_server_context, ServerContext};
pub use trust::PermissiveTrust;
