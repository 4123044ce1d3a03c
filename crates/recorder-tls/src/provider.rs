//! Crypto provider selection

use rustls::crypto::CryptoProvider;
use std::sync::Arc;

/// ALPN protocols advertised by both contexts
pub const ALPN_PROTOCOLS: &[&[u8]] = &[b"http/1.1"];

/// The process-default crypto provider, or ring when none is installed
pub fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}

pub(crate) fn alpn_protocols() -> Vec<Vec<u8>> {
    ALPN_PROTOCOLS.iter().map(|p| p.to_vec()).collect()
}
