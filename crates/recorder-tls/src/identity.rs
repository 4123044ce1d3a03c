//! Keystore decoding and the server-side key manager

use crate::error::{Error, Result};
use crate::resolver::CredentialStream;
use p12_keystore::{KeyStore, KeyStoreEntry};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decode a PKCS#12 keystore, consuming the stream
///
/// The stream is dropped before this returns, whatever the outcome.
pub fn decode_keystore(stream: CredentialStream, password: &str) -> Result<KeyStore> {
    let origin = stream.origin().clone();
    let bytes = stream
        .into_bytes()
        .map_err(|e| Error::keystore_decode(&origin, e))?;

    let keystore = KeyStore::from_pkcs12(&bytes, password)
        .map_err(|e| Error::keystore_decode(&origin, e))?;

    debug!(%origin, entries = keystore.entries().count(), "Decoded keystore");

    Ok(keystore)
}

/// A private key and the certificate chain presented with it
#[derive(Debug, Clone)]
pub struct Identity {
    alias: String,
    key: Arc<CertifiedKey>,
}

impl Identity {
    /// Keystore alias of this entry
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Certificate chain, leaf first
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.key.cert
    }

    /// The signing key and chain in the form rustls presents them
    pub fn certified_key(&self) -> &Arc<CertifiedKey> {
        &self.key
    }
}

/// Key-management capability of the server context
///
/// Holds every usable identity from the keystore and always presents the
/// first one (in alias order), whatever name the client asks for.
#[derive(Debug)]
pub struct KeyManager {
    identities: Vec<Identity>,
}

impl KeyManager {
    /// Load every private-key entry that `provider` can sign with
    pub fn from_keystore(keystore: &KeyStore, provider: &CryptoProvider) -> Result<Self> {
        let mut identities = Vec::new();
        let mut skipped = Vec::new();

        for (alias, entry) in keystore.entries() {
            let KeyStoreEntry::PrivateKeyChain(chain) = entry else {
                debug!(alias = %alias, "Ignoring certificate-only keystore entry");
                continue;
            };

            if chain.chain().is_empty() {
                skipped.push(format!("{alias}: no certificate chain"));
                continue;
            }

            let certs: Vec<CertificateDer<'static>> = chain
                .chain()
                .iter()
                .map(|cert| CertificateDer::from(cert.as_der().to_vec()))
                .collect();
            let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(chain.key().to_vec()));

            match provider.key_provider.load_private_key(key_der) {
                Ok(signing_key) => identities.push(Identity {
                    alias: alias.to_string(),
                    key: Arc::new(CertifiedKey::new(certs, signing_key)),
                }),
                Err(e) => {
                    warn!(alias = %alias, error = %e, "Skipping unusable private key");
                    skipped.push(format!("{alias}: {e}"));
                }
            }
        }

        if identities.is_empty() {
            let detail = if skipped.is_empty() {
                "keystore contains no private key entries".to_string()
            } else {
                format!("no usable private key entries ({})", skipped.join("; "))
            };
            return Err(Error::KeyManagementInit(detail));
        }

        identities.sort_by(|a, b| a.alias.cmp(&b.alias));

        info!(
            alias = %identities[0].alias,
            identities = identities.len(),
            chain_len = identities[0].chain().len(),
            "Key manager initialized"
        );

        Ok(Self { identities })
    }

    /// All loaded identities; never empty
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Identity presented during handshakes
    pub fn primary(&self) -> &Identity {
        &self.identities[0]
    }
}

impl ResolvesServerCert for KeyManager {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        debug!(sni = ?client_hello.server_name(), "Presenting recorder identity");
        Some(Arc::clone(&self.primary().key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeystoreSettings, DEFAULT_KEYSTORE_PASSWORD};
    use crate::resolver::{CredentialResolver, ResourceLoader};

    fn bundled_stream() -> CredentialStream {
        let (stream, _) = CredentialResolver::new(KeystoreSettings::default())
            .with_loaders(vec![ResourceLoader::Bundled])
            .resolve()
            .unwrap();
        stream
    }

    #[test]
    fn test_decode_bundled_keystore() {
        let keystore = decode_keystore(bundled_stream(), DEFAULT_KEYSTORE_PASSWORD).unwrap();
        assert!(keystore.entries().count() >= 1);
    }

    #[test]
    fn test_decode_wrong_password() {
        let err = decode_keystore(bundled_stream(), "not-the-password").unwrap_err();
        assert!(matches!(err, Error::KeystoreDecode { .. }));
    }

    #[test]
    fn test_key_manager_from_bundled_keystore() {
        let keystore = decode_keystore(bundled_stream(), DEFAULT_KEYSTORE_PASSWORD).unwrap();
        let provider = rustls::crypto::ring::default_provider();

        let manager = KeyManager::from_keystore(&keystore, &provider).unwrap();
        assert!(!manager.identities().is_empty());
        assert!(!manager.primary().chain().is_empty());
    }
}
