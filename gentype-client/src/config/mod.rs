//! Client configuration from explicit values or the [cluster environment](https://kubernetes.io/docs/tasks/access-application-cluster/access-cluster/#accessing-the-api-from-a-pod).
//!
//! # Usage
//! The [`Config`] has a plain constructor plus logic to infer the in-cluster environment,
//! and is consumed by a [`Client`][crate::Client].
mod features;
mod incluster_config;

pub use features::{
    ClientFeatures, LIST_FROM_CACHE_DETECTOR_ENV, WATCH_LIST_CLIENT_ENV, WATCH_LIST_DETECTOR_ENV,
};
pub use incluster_config::Error as InClusterError;

use crate::{error::ConfigError, Error, Result};
use secrecy::SecretString;
use std::time::Duration;

/// Credentials presented to the apiserver
#[derive(Debug, Clone, Default)]
pub struct AuthInfo {
    /// Bearer token, sent as `Authorization: Bearer <token>`
    pub token: Option<SecretString>,
}

/// Where and how a [`Client`](crate::Client) connects
///
/// Construct it with [`Config::new`] or [`Config::infer`], adjust the public fields as needed,
/// and hand it to [`Client::try_from`](crate::Client).
#[derive(Debug, Clone)]
pub struct Config {
    /// Apiserver url, a path is kept as a prefix of every request
    pub cluster_url: http::Uri,
    /// Namespace of clients that are not given one
    pub default_namespace: String,
    /// Trusted roots, DER encoded
    pub root_cert: Option<Vec<Vec<u8>>>,
    /// Bound on establishing a connection, unbounded when unset
    pub connect_timeout: Option<Duration>,
    /// Bound on each socket read, unbounded when unset
    ///
    /// Watches longer than this end quietly and must be restarted.
    pub read_timeout: Option<Duration>,
    /// Bound on each socket write, unbounded when unset
    pub write_timeout: Option<Duration>,
    /// Skip server certificate verification
    pub accept_invalid_certs: bool,
    /// Credentials
    pub auth_info: AuthInfo,
    /// Appended to every request
    pub headers: Vec<(http::HeaderName, http::HeaderValue)>,
    /// Feature gates changing how typed clients list
    pub features: ClientFeatures,
}

impl Config {
    /// Connect to `cluster_url` without credentials
    ///
    /// Feature gates are read from the environment.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            default_namespace: String::from("default"),
            root_cert: None,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            write_timeout: None,
            accept_invalid_certs: false,
            auth_info: AuthInfo::default(),
            headers: Vec::new(),
            features: ClientFeatures::from_env(),
        }
    }

    /// Infer the configuration from the environment
    ///
    /// Done by loading the in-cluster service account environment.
    pub fn infer() -> Result<Self> {
        Self::from_cluster_env().inspect_err(|err| {
            tracing::trace!("No in-cluster config found: {}", err);
        })
    }

    /// Create configuration from the cluster's environment variables
    ///
    /// Uses the service host variables and the mounted service account token, CA bundle
    /// and namespace.
    pub fn from_cluster_env() -> Result<Self> {
        let cluster_url = if cfg!(feature = "rustls-tls") {
            // rustls does not verify ip addresses, use the service dns name
            incluster_config::kube_dns()
        } else {
            incluster_config::kube_server()
                .ok_or(Error::InferConfig(ConfigError::MissingInClusterVariables {
                    hostenv: incluster_config::SERVICE_HOSTENV,
                    portenv: incluster_config::SERVICE_PORTENV,
                }))?
                .map_err(|e| Error::InferConfig(ConfigError::InCluster(e)))?
        };
        tracing::trace!("using in-cluster url {}", cluster_url);

        let default_namespace = incluster_config::load_default_ns().map_err(|err| {
            Error::InferConfig(ConfigError::InvalidInClusterNamespace(Box::new(
                Error::InferConfig(ConfigError::InCluster(err)),
            )))
        })?;

        let root_cert = incluster_config::load_cert()
            .map_err(|e| Error::InferConfig(ConfigError::InCluster(e)))?;

        let token = incluster_config::load_token().map_err(|err| {
            Error::InferConfig(ConfigError::InvalidInClusterToken(Box::new(Error::InferConfig(
                ConfigError::InCluster(err),
            ))))
        })?;

        Ok(Self {
            default_namespace,
            root_cert: Some(root_cert),
            auth_info: AuthInfo { token: Some(token) },
            ..Self::new(cluster_url)
        })
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_info.token = Some(SecretString::from(token.into()));
        self
    }

    /// Replace the feature gates read from the environment
    #[must_use]
    pub fn with_features(mut self, features: ClientFeatures) -> Self {
        self.features = features;
        self
    }
}

/// Default timeout for connecting
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for reading a response, watches time out server side before this
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(295);
