//! Keystore configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Prefix of the environment variables read by [`KeystoreSettings::from_env`]
pub const ENV_PREFIX: &str = "RECORDER_TLS";

/// Passphrase of the bundled keystore, used when no override is configured
pub const DEFAULT_KEYSTORE_PASSWORD: &str = "changeit";

/// Where the server identity comes from
///
/// Both fields are optional overrides. `RECORDER_TLS_KEYSTORE` and
/// `RECORDER_TLS_KEYSTORE_PASSWORD` map onto them.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeystoreSettings {
    /// Path to a PKCS#12 keystore loaded instead of the bundled default
    #[serde(default)]
    pub keystore: Option<PathBuf>,

    /// Passphrase for the keystore and its key entries
    #[serde(default)]
    pub keystore_password: Option<String>,
}

impl KeystoreSettings {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    /// Read overrides from an explicit variable map instead of the environment
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(vars))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Set the keystore path override
    pub fn with_keystore(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore = Some(path.into());
        self
    }

    /// Set the passphrase override
    pub fn with_keystore_password(mut self, password: impl Into<String>) -> Self {
        self.keystore_password = Some(password.into());
        self
    }

    /// Passphrase to use, falling back to [`DEFAULT_KEYSTORE_PASSWORD`]
    pub fn password(&self) -> &str {
        self.keystore_password
            .as_deref()
            .unwrap_or(DEFAULT_KEYSTORE_PASSWORD)
    }
}

impl fmt::Debug for KeystoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreSettings")
            .field("keystore", &self.keystore)
            .field(
                "keystore_password",
                &self.keystore_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
