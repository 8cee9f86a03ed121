//! Process-wide TLS client state.
//!
//! # Design
//! Building a rustls `ClientConfig` loads the root store and the crypto
//! provider, so it happens once per verification mode and the result is
//! shared by every HTTPS request. The state lives behind a `Mutex` and is
//! created lazily on first HTTPS use, which keeps concurrent first use safe.
//! `shutdown` drops it; the next HTTPS request rebuilds it.

use std::sync::{Arc, Mutex, PoisonError};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Default)]
struct TlsState {
    verified: Option<Arc<ClientConfig>>,
    unverified: Option<Arc<ClientConfig>>,
}

static STATE: Mutex<Option<TlsState>> = Mutex::new(None);

/// Serializes unit tests that touch `STATE`.
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Shared client configuration for the given verification mode, building it
/// on first use.
pub fn client_config(verify_certificates: bool) -> Result<Arc<ClientConfig>> {
    let mut guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let state = guard.get_or_insert_with(TlsState::default);
    let slot = if verify_certificates {
        &mut state.verified
    } else {
        &mut state.unverified
    };

    if let Some(config) = slot.as_ref() {
        return Ok(Arc::clone(config));
    }

    debug!(verify_certificates, "initializing TLS client configuration");
    let config = Arc::new(build_config(verify_certificates)?);
    *slot = Some(Arc::clone(&config));
    Ok(config)
}

/// Eagerly build the state for `verify_certificates`. Idempotent.
pub fn init(verify_certificates: bool) -> Result<()> {
    client_config(verify_certificates).map(drop)
}

/// Release the shared TLS state. Sessions already open keep their own
/// reference and finish normally.
pub fn shutdown() {
    let mut guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.take().is_some() {
        debug!("TLS client configuration released");
    }
}

pub fn is_initialized() -> bool {
    STATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|s| s.verified.is_some() || s.unverified.is_some())
}

fn build_config(verify_certificates: bool) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::transport("TLS setup", e))?;

    let config = if verify_certificates {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth()
    };
    Ok(config)
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_lazy_shared_and_resettable() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        shutdown();
        assert!(!is_initialized());

        let a = client_config(true).unwrap();
        let b = client_config(true).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(is_initialized());

        let c = client_config(false).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));

        init(true).unwrap();
        assert!(Arc::ptr_eq(&a, &client_config(true).unwrap()));

        shutdown();
        assert!(!is_initialized());
        let d = client_config(true).unwrap();
        assert!(!Arc::ptr_eq(&a, &d));
        shutdown();
    }

    #[test]
    fn unverified_config_accepts_any_certificate() {
        let verifier = AcceptAnyCertificate {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        };
        let name = ServerName::try_from("example.com").unwrap();
        let cert = CertificateDer::from(vec![0u8; 8]);
        assert!(verifier
            .verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
            .is_ok());
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}
