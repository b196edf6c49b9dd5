use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;

pub(super) const SERVICE_HOSTENV: &str = "KUBERNETES_SERVICE_HOST";
pub(super) const SERVICE_PORTENV: &str = "KUBERNETES_SERVICE_PORT";

// Mounted credential files
const SERVICE_TOKENFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_CERTFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
const SERVICE_DEFAULT_NS: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Errors from loading in-cluster config
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the default namespace for the service account
    #[error("failed to read the default namespace: {0}")]
    ReadDefaultNamespace(#[source] std::io::Error),

    /// Failed to read the service account token
    #[error("failed to read the service account token: {0}")]
    ReadToken(#[source] std::io::Error),

    /// Failed to read a certificate bundle
    #[error("failed to read a certificate bundle: {0}")]
    ReadCertificateBundle(#[source] std::io::Error),

    /// Failed to parse cluster url
    #[error("failed to parse cluster url: {0}")]
    ParseClusterUrl(#[source] http::uri::InvalidUri),

    /// Failed to parse PEM-encoded certificates
    #[error("failed to parse PEM-encoded certificates: {0}")]
    ParseCertificates(#[source] pem::PemError),
}

pub(super) fn kube_dns() -> http::Uri {
    http::Uri::from_static("https://kubernetes.default.svc/")
}

/// The apiserver address from the service environment variables, if both are set
pub(super) fn kube_server() -> Option<Result<http::Uri, Error>> {
    let host = std::env::var(SERVICE_HOSTENV).ok()?;
    let port = std::env::var(SERVICE_PORTENV).ok()?;
    Some(server_url(&host, &port))
}

fn server_url(host: &str, port: &str) -> Result<http::Uri, Error> {
    // ipv6 hosts need brackets
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    format!("https://{host}:{port}")
        .parse::<http::Uri>()
        .map_err(Error::ParseClusterUrl)
}

pub(super) fn load_token() -> Result<SecretString, Error> {
    read_token(Path::new(SERVICE_TOKENFILE))
}

fn read_token(path: &Path) -> Result<SecretString, Error> {
    let token = std::fs::read_to_string(path).map_err(Error::ReadToken)?;
    Ok(SecretString::from(token.trim().to_string()))
}

/// Returns certification from specified path in cluster.
pub(super) fn load_cert() -> Result<Vec<Vec<u8>>, Error> {
    let certs = std::fs::read(SERVICE_CERTFILE).map_err(Error::ReadCertificateBundle)?;
    certs_from_pem(&certs).map_err(Error::ParseCertificates)
}

/// Returns the default namespace from specified path in cluster.
pub(super) fn load_default_ns() -> Result<String, Error> {
    std::fs::read_to_string(SERVICE_DEFAULT_NS)
        .map(|ns| ns.trim().to_string())
        .map_err(Error::ReadDefaultNamespace)
}

/// DER encoded certificates of a PEM bundle
pub(super) fn certs_from_pem(data: &[u8]) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(data)?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .collect())
}
