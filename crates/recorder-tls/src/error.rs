//! Error types for TLS context provisioning

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while provisioning or using the recorder's TLS contexts
///
/// The first three variants are construction-time failures. They are never
/// retried internally; whoever triggers first use of a context should treat
/// them as fatal start-up errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the keystore override nor the bundled default could be opened
    #[error("Keystore unavailable: {0}")]
    CredentialUnavailable(String),

    /// Keystore bytes are malformed or the passphrase is wrong
    #[error("Failed to decode keystore {origin}: {message}")]
    KeystoreDecode {
        /// Where the keystore bytes came from
        origin: String,
        /// Decoder message
        message: String,
    },

    /// Keystore decoded but holds no usable private-key entry
    #[error("Failed to initialize key management: {0}")]
    KeyManagementInit(String),

    /// Process configuration could not be read
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// rustls rejected the context parameters
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name is neither a DNS name nor an IP address
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    /// TLS handshake with a peer failed
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a keystore decode error
    pub fn keystore_decode(origin: impl ToString, message: impl ToString) -> Self {
        Error::KeystoreDecode {
            origin: origin.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error happened while building a context
    ///
    /// Such errors are not recoverable without operator intervention.
    pub fn is_provisioning(&self) -> bool {
        matches!(
            self,
            Error::CredentialUnavailable(_)
                | Error::KeystoreDecode { .. }
                | Error::KeyManagementInit(_)
                | Error::Configuration(_)
                | Error::Tls(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystore_decode_error() {
        let err = Error::keystore_decode("bundled resource", "MAC mismatch");
        assert!(matches!(err, Error::KeystoreDecode { .. }));
        assert!(err.to_string().contains("bundled resource"));
        assert!(err.to_string().contains("MAC mismatch"));
    }

    #[test]
    fn test_provisioning_classification() {
        assert!(Error::CredentialUnavailable("x".to_string()).is_provisioning());
        assert!(Error::KeyManagementInit("x".to_string()).is_provisioning());
        assert!(!Error::InvalidServerName("x".to_string()).is_provisioning());
        assert!(!Error::Handshake(std::io::Error::other("reset")).is_provisioning());
    }
}
