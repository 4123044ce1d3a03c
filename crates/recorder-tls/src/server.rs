//! Server-side (client-facing) TLS context

use crate::config::KeystoreSettings;
use crate::error::{Error, Result};
use crate::identity::{decode_keystore, KeyManager};
use crate::provider::{alpn_protocols, crypto_provider};
use crate::resolver::{CredentialOrigin, CredentialResolver};
use rustls::server::ServerConfig;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsAcceptor;
use tracing::info;

/// TLS context the recorder presents to intercepted clients
///
/// Immutable once built. Cloning shares the same underlying configuration.
#[derive(Clone)]
pub struct ServerContext {
    config: Arc<ServerConfig>,
    key_manager: Arc<KeyManager>,
    origin: CredentialOrigin,
    acceptor: TlsAcceptor,
}

impl ServerContext {
    /// Build the context from whatever keystore `resolver` locates
    pub fn from_resolver(resolver: &CredentialResolver) -> Result<Self> {
        let (stream, password) = resolver.resolve()?;
        let origin = stream.origin().clone();
        let keystore = decode_keystore(stream, &password)?;

        let provider = crypto_provider();
        let key_manager = Arc::new(KeyManager::from_keystore(&keystore, &provider)?);

        let mut config = ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(rustls::DEFAULT_VERSIONS)?
            .with_no_client_auth()
            .with_cert_resolver(key_manager.clone());
        config.alpn_protocols = alpn_protocols();

        let config = Arc::new(config);

        info!(
            alias = %key_manager.primary().alias(),
            "Server TLS context initialized"
        );

        Ok(Self {
            acceptor: TlsAcceptor::from(Arc::clone(&config)),
            config,
            key_manager,
            origin,
        })
    }

    /// Underlying rustls configuration
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    /// Identities loaded from the keystore
    pub fn key_manager(&self) -> &KeyManager {
        &self.key_manager
    }

    /// Where the keystore came from
    pub fn origin(&self) -> &CredentialOrigin {
        &self.origin
    }

    /// Acceptor for collaborators that drive handshakes themselves
    pub fn acceptor(&self) -> &TlsAcceptor {
        &self.acceptor
    }

    /// Terminate TLS on a client-facing stream
    pub async fn accept<IO>(&self, stream: IO) -> Result<tokio_rustls::server::TlsStream<IO>>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        self.acceptor.accept(stream).await.map_err(Error::Handshake)
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("origin", &self.origin)
            .field("key_manager", &self.key_manager)
            .finish_non_exhaustive()
    }
}

/// Build the server context from keystore settings
pub fn build_server_context(settings: &KeystoreSettings) -> Result<ServerContext> {
    ServerContext::from_resolver(&CredentialResolver::new(settings.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResourceLoader;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn build(settings: KeystoreSettings) -> Result<ServerContext> {
        let resolver =
            CredentialResolver::new(settings).with_loaders(vec![ResourceLoader::Bundled]);
        ServerContext::from_resolver(&resolver)
    }

    #[test]
    fn test_bundled_keystore_builds() {
        let context = build(KeystoreSettings::default()).unwrap();

        assert!(matches!(context.origin(), CredentialOrigin::Bundled(_)));
        assert!(!context.key_manager().identities().is_empty());
        assert_eq!(context.config().alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn test_override_with_matching_password() {
        let settings = KeystoreSettings::default()
            .with_keystore(fixture("override.p12"))
            .with_keystore_password("s3cret-override");

        let context = build(settings).unwrap();
        let bundled = build(KeystoreSettings::default()).unwrap();

        assert_eq!(
            context.origin(),
            &CredentialOrigin::Override(fixture("override.p12"))
        );
        assert_ne!(
            context.key_manager().primary().chain()[0],
            bundled.key_manager().primary().chain()[0]
        );
    }

    #[test]
    fn test_override_with_default_password_fails() {
        let settings = KeystoreSettings::default().with_keystore(fixture("override.p12"));

        let err = build(settings).unwrap_err();
        assert!(matches!(err, Error::KeystoreDecode { .. }));
    }

    #[test]
    fn test_password_override_on_bundled_keystore_fails() {
        let settings = KeystoreSettings::default().with_keystore_password("s3cret-override");

        let err = build(settings).unwrap_err();
        assert!(matches!(err, Error::KeystoreDecode { .. }));
    }

    #[test]
    fn test_certificate_only_keystore() {
        let settings = KeystoreSettings::default().with_keystore(fixture("certs-only.p12"));

        let err = build(settings).unwrap_err();
        assert!(matches!(err, Error::KeyManagementInit(_)));
    }

    #[test]
    fn test_missing_override() {
        let settings = KeystoreSettings::default().with_keystore(fixture("missing.p12"));

        let err = build(settings).unwrap_err();
        assert!(matches!(err, Error::CredentialUnavailable(_)));
    }
}
