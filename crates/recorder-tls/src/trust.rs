//! Unconditional trust decisions for the upstream side
//!
//! **Insecure.** [`PermissiveTrust`] accepts every certificate chain it is
//! shown. The recorder observes and replays traffic; it is not a secure TLS
//! client and must not be used as one.
//!
//! Handshake signatures are still checked against the presented key, so a
//! peer has to hold the private key for the certificate it sends. Nothing
//! about that certificate (issuer, validity period, host name) is examined.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{DigitallySignedStruct, DistinguishedName, Error as TlsError, SignatureScheme};

/// Trust-management capability that accepts any peer certificate
#[derive(Debug, Clone)]
pub struct PermissiveTrust {
    algorithms: WebPkiSupportedAlgorithms,
}

impl PermissiveTrust {
    /// Create a verifier checking handshake signatures with `algorithms`
    pub fn new(algorithms: WebPkiSupportedAlgorithms) -> Self {
        Self { algorithms }
    }

    /// Issuers this verifier asks peers for: none
    pub fn accepted_issuers(&self) -> &[DistinguishedName] {
        &[]
    }
}

impl ServerCertVerifier for PermissiveTrust {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

impl ClientCertVerifier for PermissiveTrust {
    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        self.accepted_issuers()
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> Result<ClientCertVerified, TlsError> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{date_time_ymd, CertificateParams, KeyPair};
    use std::time::Duration;

    fn trust() -> PermissiveTrust {
        PermissiveTrust::new(
            rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn self_signed(names: &[&str]) -> CertificateDer<'static> {
        let params =
            CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
                .unwrap();
        let key_pair = KeyPair::generate().unwrap();
        params.self_signed(&key_pair).unwrap().der().clone()
    }

    fn expired() -> CertificateDer<'static> {
        let mut params = CertificateParams::new(vec!["expired.example".to_string()]).unwrap();
        params.not_before = date_time_ymd(2001, 1, 1);
        params.not_after = date_time_ymd(2002, 1, 1);
        let key_pair = KeyPair::generate().unwrap();
        params.self_signed(&key_pair).unwrap().der().clone()
    }

    fn now() -> UnixTime {
        UnixTime::since_unix_epoch(Duration::from_secs(1_760_000_000))
    }

    #[test]
    fn accepts_self_signed_server_cert() {
        let cert = self_signed(&["upstream.example"]);
        let name = ServerName::try_from("upstream.example").unwrap();

        assert!(trust()
            .verify_server_cert(&cert, &[], &name, &[], now())
            .is_ok());
    }

    #[test]
    fn accepts_wrong_hostname() {
        let cert = self_signed(&["somewhere-else.example"]);
        let name = ServerName::try_from("upstream.example").unwrap();

        assert!(trust()
            .verify_server_cert(&cert, &[], &name, &[], now())
            .is_ok());
    }

    #[test]
    fn accepts_expired_chain() {
        let leaf = expired();
        let intermediate = self_signed(&["intermediate.example"]);
        let name = ServerName::try_from("expired.example").unwrap();

        assert!(trust()
            .verify_server_cert(&leaf, &[intermediate], &name, &[], now())
            .is_ok());
    }

    #[test]
    fn accepts_garbage_bytes() {
        let cert = CertificateDer::from(vec![0u8; 16]);
        let name = ServerName::try_from("10.0.0.1").unwrap();

        assert!(trust()
            .verify_server_cert(&cert, &[], &name, &[], now())
            .is_ok());
    }

    #[test]
    fn accepts_any_client_cert() {
        let cert = expired();
        assert!(trust().verify_client_cert(&cert, &[], now()).is_ok());
    }

    #[test]
    fn accepted_issuers_is_empty() {
        let trust = trust();
        assert!(trust.accepted_issuers().is_empty());
        assert!(ClientCertVerifier::root_hint_subjects(&trust).is_empty());
    }

    #[test]
    fn offers_provider_schemes() {
        assert!(!ServerCertVerifier::supported_verify_schemes(&trust()).is_empty());
    }
}
