//! rustls client configuration for the default stack
use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};

use crate::{Config, Error, Result};

/// Create a [`rustls::ClientConfig`] trusting the given DER encoded roots
pub fn rustls_client_config(root_certs: Option<&[Vec<u8>]>, accept_invalid: bool) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsError(e.to_string()))?;

    if accept_invalid {
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification(provider)))
            .with_no_client_auth());
    }

    let mut roots = RootCertStore::empty();
    for der in root_certs.unwrap_or_default() {
        roots
            .add(CertificateDer::from(der.clone()))
            .map_err(|e| Error::TlsError(e.to_string()))?;
    }
    Ok(builder.with_root_certificates(roots).with_no_client_auth())
}

#[derive(Debug)]
struct NoCertificateVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        tracing::warn!("Server cert bypassed");
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Wrap `connector` so https urls are served through a rustls session built from `config`
pub(crate) fn https_connector<H>(config: &Config, connector: H) -> Result<HttpsConnector<H>> {
    let tls = rustls_client_config(config.root_cert.as_deref(), config.accept_invalid_certs)?;
    Ok(HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(connector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_roots() {
        let err = rustls_client_config(Some(&[b"not a certificate".to_vec()]), false);
        assert!(matches!(err, Err(Error::TlsError(_))));
    }

    #[test]
    fn accepting_invalid_certs_ignores_roots() {
        assert!(rustls_client_config(Some(&[b"ignored".to_vec()]), true).is_ok());
        assert!(rustls_client_config(None, false).is_ok());
    }
}
