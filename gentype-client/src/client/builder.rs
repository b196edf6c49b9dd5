use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use hyper::{
    body::Incoming,
    rt::{Read, Write},
};
use hyper_timeout::TimeoutConnector;
use hyper_util::{
    client::legacy::{
        connect::{Connection, HttpConnector},
        Client as HyperClient,
    },
    rt::TokioExecutor,
};
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder};
use tower_http::{
    classify::ServerErrorsFailureClass, map_response_body::MapResponseBodyLayer, trace::TraceLayer,
};
use tracing::Span;

use super::{
    body::Body,
    middleware::{ApiServerLayer, AuthLayer},
};
use crate::{config::ClientFeatures, Client, Config, Error, Result};

/// Response body of the default stack
pub type DynBody = dyn http_body::Body<Data = Bytes, Error = BoxError> + Send + Unpin;

/// Builds a [`Client`] over a tower [`Service`] stack
pub struct ClientBuilder<Svc> {
    service: Svc,
    default_ns: String,
    features: ClientFeatures,
}

impl<Svc> ClientBuilder<Svc> {
    /// Start from a custom `service`
    ///
    /// [`ClientBuilder::try_from`] starts from the default stack of a [`Config`] instead.
    pub fn new(service: Svc, default_namespace: impl Into<String>) -> Self
    where
        Svc: Service<Request<Body>>,
    {
        Self {
            service,
            default_ns: default_namespace.into(),
            features: ClientFeatures::default(),
        }
    }

    /// Set the feature gates of the built client
    #[must_use]
    pub fn with_features(mut self, features: ClientFeatures) -> Self {
        self.features = features;
        self
    }

    /// Wrap the stack in `layer`
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        let Self {
            service: stack,
            default_ns,
            features,
        } = self;
        ClientBuilder {
            service: layer.layer(stack),
            default_ns,
            features,
        }
    }

    /// Finish the stack
    pub fn build<B>(self) -> Client
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Client::new(self.service, self.default_ns).with_features(self.features)
    }
}

/// The type erased service of the default stack
pub type GenericService = BoxService<Request<Body>, Response<Box<DynBody>>, BoxError>;

impl TryFrom<Config> for ClientBuilder<GenericService> {
    type Error = Error;

    /// Connect with timeouts and TLS, then resolve against the cluster url, authenticate and trace
    fn try_from(config: Config) -> Result<Self> {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        make_generic_builder(connector, config)
    }
}

fn make_generic_builder<H>(connector: H, config: Config) -> Result<ClientBuilder<GenericService>>
where
    H: 'static + Clone + Send + Sync + Service<http::Uri>,
    H::Response: 'static + Connection + Read + Write + Send + Unpin,
    H::Future: 'static + Send,
    H::Error: 'static + Send + Sync + std::error::Error,
{
    #[cfg(feature = "rustls-tls")]
    let connector = super::tls::https_connector(&config, connector)?;
    #[cfg(not(feature = "rustls-tls"))]
    if config.cluster_url.scheme() == Some(&http::uri::Scheme::HTTPS) {
        return Err(Error::TlsRequired);
    }

    let mut connector = TimeoutConnector::new(connector);
    connector.set_connect_timeout(config.connect_timeout);
    connector.set_read_timeout(config.read_timeout);
    connector.set_write_timeout(config.write_timeout);
    let client: HyperClient<_, Body> = HyperClient::builder(TokioExecutor::new()).build(connector);

    let trace = TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_request(log_request)
        .on_response(record_response)
        .on_body_chunk(())
        .on_eos(())
        .on_failure(record_failure);
    let service = ServiceBuilder::new()
        .layer(ApiServerLayer::from_config(&config))
        .option_layer(AuthLayer::from_config(&config))
        .layer(trace)
        .map_err(BoxError::from)
        .service(client);
    let service = MapResponseBodyLayer::new(|body| {
        Box::new(BodyExt::map_err(body, BoxError::from)) as Box<DynBody>
    })
    .layer(service);

    Ok(ClientBuilder::new(BoxService::new(service), config.default_namespace).with_features(config.features))
}

// Span fields use the OpenTelemetry http client conventions
fn request_span(req: &Request<Body>) -> Span {
    tracing::debug_span!(
        "HTTP",
        http.method = %req.method(),
        http.url = %req.uri(),
        http.status_code = tracing::field::Empty,
        otel.name = req.extensions().get::<&'static str>().copied().unwrap_or("HTTP"),
        otel.kind = "client",
        otel.status_code = tracing::field::Empty,
    )
}

fn log_request(_: &Request<Body>, _: &Span) {
    tracing::debug!("requesting");
}

fn record_response(res: &Response<Incoming>, _: Duration, span: &Span) {
    let status = res.status();
    span.record("http.status_code", status.as_u16());
    if status.is_client_error() || status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }
}

fn record_failure(failure: ServerErrorsFailureClass, _: Duration, span: &Span) {
    span.record("otel.status_code", "ERROR");
    match failure {
        ServerErrorsFailureClass::StatusCode(status) => {
            span.record("http.status_code", status.as_u16());
            tracing::error!(%status, "request failed");
        }
        ServerErrorsFailureClass::Error(err) => tracing::error!(%err, "request failed"),
    }
}
