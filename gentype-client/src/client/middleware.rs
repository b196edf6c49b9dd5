//! Tower layers of the default stack
//!
//! [`ApiServerLayer`] points relative requests at the configured apiserver and adds the configured
//! headers, [`AuthLayer`] presents the bearer token.
use std::{
    sync::Arc,
    task::{Context, Poll},
};

use http::{uri::PathAndQuery, HeaderName, HeaderValue, Request, Uri};
use secrecy::{ExposeSecret, SecretString};
use tower::{Layer, Service};
use tower_http::auth::{AddAuthorization, AddAuthorizationLayer};

use crate::Config;

/// Layer resolving request paths against an apiserver base URI
///
/// A path in the base URI is kept as a prefix, for apiservers behind a path routing proxy.
#[derive(Debug, Clone)]
pub struct ApiServerLayer {
    base: Uri,
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl ApiServerLayer {
    /// Resolve requests against `base`
    pub fn new(base: Uri) -> Self {
        Self {
            base,
            headers: Arc::new([]),
        }
    }

    /// Also append `headers` to every request
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (HeaderName, HeaderValue)>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    /// The cluster url and headers of `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cluster_url.clone()).with_headers(config.headers.iter().cloned())
    }
}

impl<S> Layer<S> for ApiServerLayer {
    type Service = ApiServer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiServer {
            layer: self.clone(),
            inner,
        }
    }
}

/// Service produced by [`ApiServerLayer`]
#[derive(Debug, Clone)]
pub struct ApiServer<S> {
    layer: ApiServerLayer,
    inner: S,
}

impl<S, B> Service<Request<B>> for ApiServer<S>
where
    S: Service<Request<B>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        *req.uri_mut() = resolve(&self.layer.base, req.uri().path_and_query());
        // append keeps what the request already set, e.g. a patch content type
        for (name, value) in self.layer.headers.iter() {
            req.headers_mut().append(name.clone(), value.clone());
        }
        self.inner.call(req)
    }
}

fn resolve(base: &Uri, path: Option<&PathAndQuery>) -> Uri {
    let Some(path) = path else {
        return base.clone();
    };
    let prefix = base.path().trim_end_matches('/');
    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(format!("{prefix}{path}").parse().unwrap_or_else(|_| path.clone()));
    Uri::from_parts(parts).unwrap_or_else(|_| base.clone())
}

/// Layer adding a bearer `Authorization` header, marked sensitive
#[derive(Clone)]
pub struct AuthLayer(AddAuthorizationLayer);

impl AuthLayer {
    /// Authenticate with `token`
    pub fn bearer(token: &SecretString) -> Self {
        Self(AddAuthorizationLayer::bearer(token.expose_secret()).as_sensitive(true))
    }

    /// The token of `config`, if it has one
    pub fn from_config(config: &Config) -> Option<Self> {
        config.auth_info.token.as_ref().map(Self::bearer)
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AddAuthorization<S>;

    fn layer(&self, inner: S) -> Self::Service {
        self.0.layer(inner)
    }
}
