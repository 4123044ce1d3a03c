//! Client-side (upstream-facing) TLS context

use crate::error::{Error, Result};
use crate::provider::{alpn_protocols, crypto_provider};
use crate::trust::PermissiveTrust;
use rustls::client::ClientConfig;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tracing::warn;

/// TLS context the recorder uses toward upstream servers
///
/// Accepts any server certificate and presents none of its own.
#[derive(Clone)]
pub struct ClientContext {
    config: Arc<ClientConfig>,
    trust: Arc<PermissiveTrust>,
    connector: TlsConnector,
}

impl ClientContext {
    /// Underlying rustls configuration
    pub fn config(&self) -> &Arc<ClientConfig> {
        &self.config
    }

    /// Trust-management capability of this context
    pub fn trust(&self) -> &PermissiveTrust {
        &self.trust
    }

    /// Connector for collaborators that drive handshakes themselves
    pub fn connector(&self) -> &TlsConnector {
        &self.connector
    }

    /// Originate TLS toward `host` over an already connected stream
    ///
    /// `host` is sent as SNI when it is a DNS name; IP literals are accepted
    /// as well.
    pub async fn connect<IO>(
        &self,
        host: &str,
        stream: IO,
    ) -> Result<tokio_rustls::client::TlsStream<IO>>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::InvalidServerName(host.to_string()))?;

        self.connector
            .connect(server_name, stream)
            .await
            .map_err(Error::Handshake)
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("trust", &self.trust)
            .finish_non_exhaustive()
    }
}

/// Build the upstream-facing context
///
/// Consults no external resource, so it cannot fail.
pub fn build_client_context() -> ClientContext {
    // Installs the crate's provider as process default when none is set yet.
    let builder = ClientConfig::builder();
    let trust = Arc::new(PermissiveTrust::new(
        crypto_provider().signature_verification_algorithms,
    ));

    let mut config = builder
        .dangerous()
        .with_custom_certificate_verifier(trust.clone())
        .with_no_client_auth();
    config.alpn_protocols = alpn_protocols();

    warn!("Client TLS context accepts any upstream certificate without verification");

    let config = Arc::new(config);
    ClientContext {
        connector: TlsConnector::from(Arc::clone(&config)),
        config,
        trust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_context_builds() {
        let context = build_client_context();
        assert!(!context.config().client_auth_cert_resolver.has_certs());
        assert_eq!(context.config().alpn_protocols, vec![b"http/1.1".to_vec()]);
        assert!(context.trust().accepted_issuers().is_empty());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_host() {
        let context = build_client_context();
        let (client, _server) = tokio::io::duplex(1024);

        let err = context.connect("not a host name", client).await.unwrap_err();
        assert!(matches!(err, Error::InvalidServerName(_)));
    }
}
