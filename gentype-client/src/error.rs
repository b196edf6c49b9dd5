//! Errors of the client crate
use thiserror::Error;

pub use gentype_core::ErrorResponse;

/// Failures of transport, typed and fake clients
#[derive(Error, Debug)]
pub enum Error {
    /// The apiserver answered with a `Status`
    ///
    /// Watch streams carry these as `ERROR` events too, a `410 Gone` there means the
    /// requested resource version has been compacted away.
    #[error("api error: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// The connection failed
    #[error("connection error: {0}")]
    HyperError(#[source] hyper::Error),

    /// A layer of the service stack failed
    #[error("service error: {0}")]
    Service(#[source] tower::BoxError),

    /// The client side deadline of a request elapsed
    #[error("request timed out after {0:?}")]
    RequestTimeout(std::time::Duration),

    /// A text response was not UTF-8
    #[error("response is not UTF-8: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// A watch line outgrew the line codec
    #[error("watch line exceeds the maximum length")]
    LinesCodecMaxLineLengthExceeded,

    /// Reading a watch stream failed
    #[error("failed to read watch stream: {0}")]
    ReadEvents(#[source] std::io::Error),

    /// A response or watch event did not decode
    #[error("failed to decode response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// A request could not be built
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] gentype_core::Error),

    /// No usable configuration was found
    #[error("failed to load config: {0}")]
    InferConfig(#[source] ConfigError),

    /// Server-side apply was called with a configuration that cannot be sent
    #[error("{0}")]
    Apply(#[source] ApplyError),

    /// A watch-list request did not produce a list
    #[error("watch-list failed: {0}")]
    WatchList(#[source] WatchListError),

    /// A fake client call was not handled
    #[error("fake: {0}")]
    Fake(String),

    /// The cluster url is https but the `rustls-tls` feature is off
    #[error("https cluster url needs the rustls-tls feature")]
    TlsRequired,

    /// The TLS configuration was rejected
    #[error("tls error: {0}")]
    TlsError(String),
}

/// Validation failures of server-side apply calls
///
/// These are raised before any request is made.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {
    /// The apply configuration passed to a client was empty
    #[error("object provided to Apply must not be nil")]
    ObjectEmpty,

    /// The apply configuration passed to a client had no name
    #[error("obj.Name must be provided to Apply")]
    ObjectNameMissing,

    /// The apply configuration passed to a fake client was empty
    #[error("configuration provided to Apply must not be nil")]
    ConfigurationEmpty,

    /// The apply configuration passed to a fake client had no name
    #[error("configuration.Name must be provided to Apply")]
    ConfigurationNameMissing,
}

/// Ways a watch-list stream can fail to assemble a list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchListError {
    /// The stream carried an event other than `ADDED` or `BOOKMARK`
    #[error("unexpected {0} event while waiting for the initial events")]
    UnexpectedEvent(&'static str),

    /// The stream ended before the bookmark marking the end of the initial events
    #[error("watch ended before the initial events were received")]
    Incomplete,
}

/// Failures loading the in-cluster configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The service host and port variables are not set
    #[error("not running in a cluster: {hostenv} and {portenv} must be set")]
    MissingInClusterVariables {
        /// Host variable name
        hostenv: &'static str,
        /// Port variable name
        portenv: &'static str,
    },

    /// The mounted namespace could not be read
    #[error("failed to load the in-cluster namespace: {0}")]
    InvalidInClusterNamespace(#[source] Box<Error>),

    /// The mounted token could not be read
    #[error("failed to load the in-cluster token: {0}")]
    InvalidInClusterToken(#[source] Box<Error>),

    /// Reading the service account mount failed
    #[error("failed to load the in-cluster config: {0}")]
    InCluster(#[source] crate::config::InClusterError),
}
