//! The transport behind every typed client
//!
//! The [`Client`] executes built requests over a [tower](tower::Service) stack and decodes
//! JSON responses, apiserver error statuses and newline delimited watch streams.
//! [`ClientBuilder`] assembles the default stack from a [`Config`], out of layers that are also
//! exported for custom stacks.
use futures::{
    future::{self, BoxFuture},
    stream::BoxStream,
    StreamExt, TryStreamExt,
};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::io;
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    io::StreamReader,
};
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{
    config::ClientFeatures,
    core::{request::RequestTimeout, WatchEvent},
    error::ErrorResponse,
    Config, Error, Result,
};

mod body;
mod builder;
mod middleware;
#[cfg(feature = "rustls-tls")] mod tls;

pub use body::Body;
pub use builder::{ClientBuilder, DynBody, GenericService};
pub use middleware::{ApiServer, ApiServerLayer, AuthLayer};

/// Executes requests against an apiserver
///
/// Build one from the in-cluster environment with [`Client::try_default`], from a [`Config`]
/// with [`Client::try_from`], or over any tower stack with [`Client::new`].
/// Clones share the underlying stack.
#[derive(Clone)]
pub struct Client {
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
    default_ns: String,
    features: ClientFeatures,
}

const BUFFER_CAPACITY: usize = 1024;

impl Client {
    /// Wrap a custom `service` stack
    ///
    /// [`ApiServerLayer`] and [`AuthLayer`] cover what a custom stack needs from a [`Config`].
    /// Feature gates start disabled, see [`Client::with_features`].
    ///
    /// # Example
    ///
    /// ```rust
    /// # fn doc() -> Result<(), Box<dyn std::error::Error>> {
    /// use gentype_client::{
    ///     client::{ApiServerLayer, AuthLayer, Body},
    ///     Client, Config,
    /// };
    /// use hyper_util::rt::TokioExecutor;
    /// use tower::ServiceBuilder;
    ///
    /// let config = Config::new("http://127.0.0.1:8001".parse()?);
    /// let service = ServiceBuilder::new()
    ///     .layer(ApiServerLayer::from_config(&config))
    ///     .option_layer(AuthLayer::from_config(&config))
    ///     .service(hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build_http::<Body>());
    /// let client = Client::new(service, config.default_namespace);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<S, B, T>(service: S, default_namespace: T) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
        T: Into<String>,
    {
        let service = MapResponseBodyLayer::new(Body::wrap_body)
            .layer(service)
            .map_err(Into::into);
        Self {
            inner: Buffer::new(BoxService::new(service), BUFFER_CAPACITY),
            default_ns: default_namespace.into(),
            features: ClientFeatures::default(),
        }
    }

    /// Replace the feature gates of this client
    #[must_use]
    pub fn with_features(mut self, features: ClientFeatures) -> Self {
        self.features = features;
        self
    }

    /// Connect with [`Config::infer`]
    pub fn try_default() -> Result<Self> {
        Self::try_from(Config::infer()?)
    }

    /// The namespace this client was configured with
    pub fn default_namespace(&self) -> &str {
        &self.default_ns
    }

    /// The feature gates this client was configured with
    pub fn features(&self) -> ClientFeatures {
        self.features
    }

    /// Send `request` through the stack
    ///
    /// The response status is not inspected and [`RequestTimeout`] is not applied.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        svc.ready().await.map_err(Error::Service)?;
        svc.call(request).await.map_err(stack_error)
    }

    /// Like [`Client::request_text`], decoding the body as JSON
    pub async fn request<T>(&self, request: Request<Vec<u8>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self.request_text(request).await?;
        serde_json::from_str(&text).map_err(|err| {
            tracing::warn!(%err, body = %text, "undecodable response");
            Error::SerdeError(err)
        })
    }

    /// Send `request` and read the whole body as text
    ///
    /// Error statuses become [`Error::Api`]. A [`RequestTimeout`] in the request extensions
    /// bounds the whole exchange, including reading the body.
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let deadline = request.extensions().get::<RequestTimeout>().map(|t| t.0);
        let exchange = async move {
            let res = self.send(request.map(Body::from)).await?;
            let status = res.status();
            let text = read_text(res.into_body()).await?;
            handle_api_errors(&text, status)?;
            Ok::<_, Error>(text)
        };
        match deadline {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| Error::RequestTimeout(limit))?,
            None => exchange.await,
        }
    }

    /// Send a watch `request` and decode the newline delimited events of the response
    ///
    /// The stream ends when the server closes the watch. Dropping it cancels the request.
    pub async fn request_events<T>(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<BoxStream<'static, Result<WatchEvent<T>>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let res = self.send(request.map(Body::from)).await?;
        let (parts, body) = res.into_parts();
        tracing::trace!(status = %parts.status, headers = ?parts.headers, "watch response");
        if parts.status.is_client_error() || parts.status.is_server_error() {
            let text = read_text(body).await?;
            return Err(api_error(&text, parts.status));
        }

        let lines = FramedRead::new(
            StreamReader::new(body.into_data_stream().map_err(body_io_error)),
            LinesCodec::new(),
        );
        Ok(lines
            .filter_map(|line| future::ready(decode_event::<T>(line)))
            .boxed())
    }
}

impl TryFrom<Config> for Client {
    type Error = Error;

    /// Connect over the default stack of [`ClientBuilder`]
    fn try_from(config: Config) -> Result<Self> {
        Ok(ClientBuilder::try_from(config)?.build())
    }
}

fn stack_error(err: BoxError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(err) => match err.downcast::<hyper::Error>() {
            Ok(err) => Error::HyperError(*err),
            Err(err) => Error::Service(err),
        },
    }
}

async fn read_text(body: Body) -> Result<String> {
    let bytes = body.collect_bytes().await?;
    String::from_utf8(bytes.to_vec()).map_err(Error::FromUtf8)
}

fn decode_event<T: DeserializeOwned>(line: Result<String, LinesCodecError>) -> Option<Result<WatchEvent<T>>> {
    match line {
        Ok(line) => match serde_json::from_str::<WatchEvent<T>>(&line) {
            Ok(event) => Some(Ok(event)),
            // partial last line flushed by `decode_eof`
            Err(err) if err.is_eof() => None,
            Err(err) => Some(Err(serde_json::from_str::<ErrorResponse>(&line)
                .map_or(Error::SerdeError(err), Error::Api))),
        },
        Err(LinesCodecError::Io(err))
            if matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof) =>
        {
            tracing::warn!(%err, "watch stream interrupted");
            None
        }
        Err(LinesCodecError::Io(err)) => Some(Err(Error::ReadEvents(err))),
        Err(LinesCodecError::MaxLineLengthExceeded) => Some(Err(Error::LinesCodecMaxLineLengthExceeded)),
    }
}

// Read timeouts and chunked EOFs of long watches end the stream instead of failing it
fn body_io_error(err: Error) -> io::Error {
    let timed_out = match &err {
        Error::HyperError(e) => e.is_timeout(),
        Error::Service(e) => e.downcast_ref::<hyper::Error>().is_some_and(hyper::Error::is_timeout),
        _ => false,
    };
    let kind = if timed_out {
        io::ErrorKind::TimedOut
    } else if err.to_string().contains("unexpected EOF during chunk") {
        io::ErrorKind::UnexpectedEof
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, err)
}

/// Turn an error `status` into [`Error::Api`]
///
/// Bodies that are not a `Status` object are wrapped in one built from the status code.
pub fn handle_api_errors(text: &str, status: StatusCode) -> Result<()> {
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(());
    }
    Err(api_error(text, status))
}

fn api_error(text: &str, status: StatusCode) -> Error {
    let response = serde_json::from_str::<ErrorResponse>(text).unwrap_or_else(|_| {
        tracing::warn!(%status, body = text, "error status without a Status body");
        ErrorResponse {
            status: status.to_string(),
            code: status.as_u16(),
            message: format!("{text:?}"),
            reason: "Failed to parse error data".into(),
            details: None,
        }
    });
    tracing::debug!(?response, "request failed");
    Error::Api(response)
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use crate::{client::Body, core::WatchEvent, Client, Error};

    use futures::StreamExt;
    use http::{Request, Response};
    use k8s_openapi::api::core::v1::ConfigMap;
    use tower_test::mock;

    fn cm_event(kind: &str, name: &str) -> String {
        serde_json::json!({
            "type": kind,
            "object": {"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": name}},
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_default_ns() {
        let (mock_service, _) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "test-namespace");
        assert_eq!(client.default_namespace(), "test-namespace");
        assert!(!client.features().watch_list_client);
    }

    #[tokio::test]
    async fn test_mock() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            // Receive a request for configmap and respond with some data
            let mut handle = pin!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(request.uri().to_string(), "/api/v1/namespaces/default/configmaps/test");
            let cm: ConfigMap = serde_json::from_value(serde_json::json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "test", "namespace": "default"},
                "data": {"k": "v"},
            }))
            .unwrap();
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&cm).unwrap()))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service, "default");
        let req = Request::get("/api/v1/namespaces/default/configmaps/test")
            .body(vec![])
            .unwrap();
        let cm: ConfigMap = client.request(req).await.unwrap();
        assert_eq!(cm.metadata.name.unwrap(), "test");
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn error_status_becomes_api_error() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            let mut handle = pin!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_response(
                Response::builder()
                    .status(404)
                    .body(Body::from(
                        serde_json::to_vec(&crate::error::ErrorResponse::not_found("configmaps", "gone"))
                            .unwrap(),
                    ))
                    .unwrap(),
            );
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_response(
                Response::builder()
                    .status(503)
                    .body(Body::from(b"upstream unavailable".to_vec()))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service, "default");
        let err = client
            .request_text(Request::get("/api/v1/configmaps/gone").body(vec![]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ref e) if e.is_not_found()), "{err}");

        let err = client
            .request_text(Request::get("/api/v1/configmaps").body(vec![]).unwrap())
            .await
            .unwrap_err();
        match err {
            Error::Api(e) => {
                assert_eq!(e.code, 503);
                assert_eq!(e.reason, "Failed to parse error data");
            }
            other => panic!("unexpected error {other}"),
        }
        spawned.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn request_timeout_extension_is_enforced() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            let mut handle = pin!(handle);
            // Hold the request without answering until the client gives up
            let (_request, send) = handle.next_request().await.expect("service not called");
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            drop(send);
        });

        let client = Client::new(mock_service, "default");
        let mut req = Request::get("/api/v1/configmaps").body(vec![]).unwrap();
        req.extensions_mut()
            .insert(crate::core::request::RequestTimeout(std::time::Duration::from_secs(5)));
        let err = client.request_text(req).await.unwrap_err();
        assert!(matches!(err, Error::RequestTimeout(d) if d.as_secs() == 5));
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn watch_events_are_decoded_per_line() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            let mut handle = pin!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            let error = serde_json::json!({
                "type": "ERROR",
                "object": {"status": "Failure", "message": "too old", "reason": "Expired", "code": 410},
            });
            let lines = [
                cm_event("ADDED", "a"),
                cm_event("MODIFIED", "a"),
                error.to_string(),
                String::new(),
            ]
            .join("\n");
            send.send_response(Response::builder().body(Body::from(lines.into_bytes())).unwrap());
        });

        let client = Client::new(mock_service, "default");
        let req = Request::get("/api/v1/configmaps?watch=true").body(vec![]).unwrap();
        let events: Vec<_> = client
            .request_events::<ConfigMap>(req)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Ok(WatchEvent::Added(_))));
        assert!(matches!(events[1], Ok(WatchEvent::Modified(_))));
        assert!(matches!(&events[2], Ok(WatchEvent::Error(e)) if e.code == 410));
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn watch_refused_by_server_is_an_error() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            let mut handle = pin!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            let status = serde_json::json!({
                "kind": "Status", "status": "Failure", "message": "forbidden", "reason": "Forbidden", "code": 403,
            });
            send.send_response(
                Response::builder()
                    .status(403)
                    .body(Body::from(serde_json::to_vec(&status).unwrap()))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service, "default");
        let req = Request::get("/api/v1/configmaps?watch=true").body(vec![]).unwrap();
        let err = client.request_events::<ConfigMap>(req).await.err().unwrap();
        assert!(matches!(err, Error::Api(e) if e.code == 403));
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn watch_failure_without_status_body_keeps_the_code() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            let mut handle = pin!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_response(Response::builder().status(502).body(Body::from(b"bad gateway".to_vec())).unwrap());
        });

        let client = Client::new(mock_service, "default");
        let req = Request::get("/api/v1/configmaps?watch=true").body(vec![]).unwrap();
        let err = client.request_events::<ConfigMap>(req).await.err().unwrap();
        match err {
            Error::Api(e) => {
                assert_eq!(e.code, 502);
                assert_eq!(e.reason, "Failed to parse error data");
            }
            other => panic!("unexpected error {other}"),
        }
        spawned.await.unwrap();
    }
}
